pub mod error;
pub mod orchestrator;
pub mod session;
pub mod symbol;
pub mod traits;
pub mod types;
pub mod window;

pub use error::{QuizError, QuizResult};
pub use orchestrator::QuizOrchestrator;
pub use symbol::{Symbol, ALLOWED_SYMBOLS, QUOTE_SUFFIX};
pub use traits::{Explainer, MarketData};
pub use types::{Candle, QuizRound, ScoringResult};
