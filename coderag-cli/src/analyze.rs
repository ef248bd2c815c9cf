//! The two analysis paths: retrieval-augmented and direct.
//!
//! Both read the target file, build a prompt, and ask the model. The RAG
//! path degrades silently to the direct prompt shape when retrieval finds
//! nothing; that is not an error.

use anyhow::{Context, Result};
use coderag_retriever::Retriever;
use std::path::Path;

use crate::llm::ChatModel;

/// The model's answer plus the chunk texts used as context (empty when no
/// retrieval happened or nothing was found).
#[derive(Debug, Clone)]
pub struct Analysis {
    pub answer: String,
    pub context_docs: Vec<String>,
}

/// Build the analysis prompt, with or without retrieved context.
pub fn build_prompt(context: Option<&str>, code: &str) -> String {
    match context {
        Some(context) => {
            format!("Based on the following context:\n\n{context}\n\nAnalyze the code:\n\n{code}")
        }
        None => format!("Analyze the following code:\n\n{code}"),
    }
}

/// Analyze a code file with retrieved corpus context when available.
pub async fn analyze_with_rag(
    file: &Path,
    retriever: &Retriever,
    llm: &dyn ChatModel,
) -> Result<Analysis> {
    let code_text = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("reading {}", file.display()))?;

    let relevant = retriever.retrieve(&code_text).await?;

    if relevant.is_empty() {
        tracing::info!("No relevant documents found, querying LLM directly");
        let answer = llm.complete(&build_prompt(None, &code_text)).await?;
        return Ok(Analysis {
            answer,
            context_docs: Vec::new(),
        });
    }

    tracing::info!("Relevant documents found, using RAG");
    let docs: Vec<String> = relevant.into_iter().map(|chunk| chunk.content).collect();
    let context = docs.join("\n\n");
    let answer = llm.complete(&build_prompt(Some(&context), &code_text)).await?;

    Ok(Analysis {
        answer,
        context_docs: docs,
    })
}

/// Analyze a code file with the model alone. Never touches the index.
pub async fn analyze_direct(file: &Path, llm: &dyn ChatModel) -> Result<Analysis> {
    let code_text = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("reading {}", file.display()))?;

    let answer = llm.complete(&build_prompt(None, &code_text)).await?;
    Ok(Analysis {
        answer,
        context_docs: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use coderag_embed::{EmbeddingProvider, EmbeddingResult};
    use coderag_retriever::{ChunkIndex, ChunkRecord};
    use half::f16;
    use std::sync::{Arc, Mutex};
    use tempfile::tempdir;

    /// Chat model that records every prompt and replies with a fixed answer.
    struct RecordingChat {
        prompts: Mutex<Vec<String>>,
    }

    impl RecordingChat {
        fn new() -> Self {
            Self {
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ChatModel for RecordingChat {
        async fn complete(&self, prompt: &str) -> Result<String> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok("mock answer".to_string())
        }
    }

    /// Embedding provider returning a constant vector.
    struct StubProvider;

    #[async_trait]
    impl EmbeddingProvider for StubProvider {
        async fn embed_text(&self, _text: &str) -> coderag_embed::Result<Vec<f16>> {
            Ok(vec![f16::from_f32(1.0), f16::from_f32(0.0)])
        }

        async fn embed_texts(&self, texts: &[String]) -> coderag_embed::Result<EmbeddingResult> {
            Ok(EmbeddingResult::new(
                texts.iter().map(|_| vec![f16::from_f32(1.0), f16::from_f32(0.0)]).collect(),
            ))
        }

        fn embedding_dimension(&self) -> usize {
            2
        }

        fn provider_name(&self) -> &str {
            "stub"
        }
    }

    fn write_code_file(dir: &tempfile::TempDir, code: &str) -> std::path::PathBuf {
        let path = dir.path().join("snippet.py");
        std::fs::write(&path, code).unwrap();
        path
    }

    #[tokio::test]
    async fn direct_analysis_uses_the_plain_prompt() -> Result<()> {
        let dir = tempdir()?;
        let code = "print('hi')\n";
        let file = write_code_file(&dir, code);
        let chat = RecordingChat::new();

        let analysis = analyze_direct(&file, &chat).await?;

        assert_eq!(analysis.answer, "mock answer");
        assert!(analysis.context_docs.is_empty());
        assert_eq!(
            chat.prompts(),
            vec![format!("Analyze the following code:\n\n{code}")]
        );
        Ok(())
    }

    #[tokio::test]
    async fn empty_retrieval_degrades_to_the_direct_prompt() -> Result<()> {
        let dir = tempdir()?;
        let code = "def f():\n    pass\n";
        let file = write_code_file(&dir, code);
        let chat = RecordingChat::new();

        // Empty index: retrieval returns nothing.
        let index = ChunkIndex::open_memory().await?;
        let retriever = Retriever::new(index, Arc::new(StubProvider), 5);

        let analysis = analyze_with_rag(&file, &retriever, &chat).await?;

        assert!(analysis.context_docs.is_empty());
        // Same prompt shape as the non-augmented analyzer: no context
        // section at all.
        let direct = analyze_direct(&file, &chat).await?;
        assert!(direct.context_docs.is_empty());
        let prompts = chat.prompts();
        assert_eq!(prompts[0], prompts[1]);
        assert!(!prompts[0].contains("Based on the following context"));
        Ok(())
    }

    #[tokio::test]
    async fn retrieved_chunks_are_woven_into_the_prompt() -> Result<()> {
        let dir = tempdir()?;
        let code = "eval(input())\n";
        let file = write_code_file(&dir, code);
        let chat = RecordingChat::new();

        let index = ChunkIndex::open_memory().await?;
        index
            .upsert_chunks(&[
                ChunkRecord {
                    id: None,
                    source: "paper.pdf".into(),
                    page: 1,
                    sequence: 0,
                    content: "never eval untrusted input".into(),
                    embedding: vec![f16::from_f32(1.0), f16::from_f32(0.0)],
                },
                ChunkRecord {
                    id: None,
                    source: "paper.pdf".into(),
                    page: 2,
                    sequence: 0,
                    content: "sanitize user data".into(),
                    embedding: vec![f16::from_f32(0.9), f16::from_f32(0.1)],
                },
            ])
            .await?;
        let retriever = Retriever::new(index, Arc::new(StubProvider), 5);

        let analysis = analyze_with_rag(&file, &retriever, &chat).await?;

        assert_eq!(analysis.context_docs.len(), 2);
        assert_eq!(analysis.context_docs[0], "never eval untrusted input");

        let prompt = &chat.prompts()[0];
        assert!(prompt.starts_with("Based on the following context:\n\n"));
        // Chunks joined in rank order, double-newline separated.
        assert!(prompt.contains("never eval untrusted input\n\nsanitize user data"));
        assert!(prompt.ends_with(&format!("Analyze the code:\n\n{code}")));
        Ok(())
    }
}
