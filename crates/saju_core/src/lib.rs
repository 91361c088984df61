pub mod calendar;
pub mod domain;
pub mod elements;
pub mod pillars;
pub mod ports;
pub mod prompt;

pub use domain::{
    BirthInput, Consultation, ConsultationStatus, Element, FortuneCategory, FourPillars,
    Gender, GatewayApproval, NewConsultation, NewPayment, Payment, PaymentStatus, Pillar, Product,
};
pub use ports::{DatabaseService, FortuneTextService, PaymentGatewayService, PortError, PortResult};
