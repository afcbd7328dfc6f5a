pub mod error;
pub mod executor;
pub mod generator;
pub mod handlers;
pub mod router;
pub mod server;

pub use error::{ApiError, Result};
pub use executor::{CodeExecutor, ExecutionOutput, PythonExecutor};
pub use generator::{OllamaGenerator, QueryGenerator};
pub use handlers::AppState;
pub use router::create_router;
pub use server::run_server;
