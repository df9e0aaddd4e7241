pub mod agent;
pub mod invoice;
pub mod llm;
pub mod metering;
pub mod speech;
pub mod sql_tools;
