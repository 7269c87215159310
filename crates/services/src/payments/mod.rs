pub mod ports;
pub mod razorpay;

pub use ports::{GatewayError, GatewayOrder, GatewayPayment, PaymentGateway};
pub use razorpay::RazorpayClient;
