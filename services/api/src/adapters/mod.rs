pub mod db;
pub mod fortune_llm;
pub mod toss;

pub use db::DbAdapter;
pub use fortune_llm::OpenAiFortuneAdapter;
pub use toss::TossGatewayAdapter;
