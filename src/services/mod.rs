pub mod checkout;
pub mod reconciler;
pub mod status;

pub use checkout::{CheckoutRequest, CheckoutService, CustomerInfo};
pub use reconciler::{ReconcileOutcome, WebhookReconciler};
pub use status::{EnrollmentDetails, EnrollmentStatusService};
