pub mod category;
pub mod engine;
pub mod ledger;
pub mod parser;
pub mod pipeline;
pub mod replay_guard;
pub mod reward;
pub mod selection;

pub use crate::domain::model::{ActiveReceptacle, CreditReceipt, DeclaredCategory, ScanEvent};
pub use crate::domain::ports::{Feedback, FrameSource, PayloadDecoder, PointStore};
pub use crate::utils::error::Result;
