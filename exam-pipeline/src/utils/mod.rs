pub mod docx_ingestion;
pub mod file_text_extraction;
pub mod llm_instructions;
