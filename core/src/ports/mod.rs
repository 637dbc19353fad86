//! Collaborators the lifecycle manager talks to. Each is injected as a trait
//! object so the HTTP app can plug in Postgres and real providers while tests
//! use the in-memory store and recording doubles.

pub mod notify;
pub mod payment;
pub mod store;

pub use notify::{DispatchReport, NotificationDispatcher, TemplateData, TemplateKey};
pub use payment::{PaymentGateway, RefundRequest, RefundResponse};
pub use store::{OrderStore, PaymentChange, ReviewModeration, StatusChange};
