/// Historic plan names still arriving from older clients, mapped to the
/// plan actually sold today. Consulted once at subscription-creation time.
const PLAN_NAME_ALIASES: &[(&str, &str)] = &[("Enterprise", "Pro"), ("Business", "Ultimate")];

/// Resolve a requested plan name to its canonical form. Unaliased names
/// pass through unchanged.
pub fn canonical_plan_name(name: &str) -> &str {
    let trimmed = name.trim();
    PLAN_NAME_ALIASES
        .iter()
        .find(|(alias, _)| alias.eq_ignore_ascii_case(trimmed))
        .map(|(_, canonical)| *canonical)
        .unwrap_or(trimmed)
}
