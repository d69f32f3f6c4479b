//! Pipeline stage implementations

mod dispatch;
mod normalize;
mod respond;
mod translate;
mod validate;

pub use dispatch::DispatchStage;
pub use normalize::{NormalizeStage, THINKING_TEMPERATURE, normalize_request};
pub use respond::ResponseStage;
pub use translate::TranslateStage;
pub use validate::{MIN_THINKING_BUDGET, ValidateStage, validate_request};
