//! Answer resolver - layered resolution from manual Q/A to document retrieval

use std::sync::Arc;

use crate::domain::{
    ChatMessage, DomainError, EmbeddingClient, KnowledgeStore, LanguageModel, Payload,
    ResolvedAnswer, TenantId, VectorStore, TEXT_PAYLOAD_KEY,
};

/// Nearest chunks fetched per query
const TOP_K: usize = 8;

/// Points sampled when probing the tenant's stored payload shape
const PROBE_LIMIT: usize = 3;

/// Payload keys tried in order when reading chunk text, covering indexes
/// written by earlier ingestion pipelines
const TEXT_KEY_PREFERENCE: [&str; 7] = [
    "page_content",
    "text",
    "content",
    "chunk",
    "body",
    "document",
    "raw_text",
];

const SYSTEM_PROMPT_HEADER: &str =
    "You are an AI assistant that answers questions based on the provided business documents.";

const SYSTEM_PROMPT_FOOTER: &str = "If the answer is not explicitly stated, respond with a \
     helpful summary of the relevant information from the context.";

/// Resolves a tenant query through fixed stages, each a terminal
/// short-circuit: manual Q/A lookup, stored-context probe, semantic
/// retrieval, then language-model synthesis.
///
/// Resolution never returns `Err`; any downstream failure folds into an
/// error-provenance answer so the caller always has a displayable string.
pub struct AnswerResolver {
    knowledge_store: Arc<dyn KnowledgeStore>,
    embedding: Arc<dyn EmbeddingClient>,
    vector_store: Arc<dyn VectorStore>,
    llm: Arc<dyn LanguageModel>,
}

impl std::fmt::Debug for AnswerResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnswerResolver").finish()
    }
}

impl AnswerResolver {
    pub fn new(
        knowledge_store: Arc<dyn KnowledgeStore>,
        embedding: Arc<dyn EmbeddingClient>,
        vector_store: Arc<dyn VectorStore>,
        llm: Arc<dyn LanguageModel>,
    ) -> Self {
        Self {
            knowledge_store,
            embedding,
            vector_store,
            llm,
        }
    }

    /// Answers a query for one tenant.
    pub async fn answer(&self, tenant_id: &TenantId, query: &str) -> ResolvedAnswer {
        match self.resolve(tenant_id, query).await {
            Ok(resolved) => resolved,
            Err(e) => {
                tracing::warn!(tenant_id = %tenant_id, error = %e, "query resolution failed");
                ResolvedAnswer::from_error(e.to_string())
            }
        }
    }

    async fn resolve(
        &self,
        tenant_id: &TenantId,
        query: &str,
    ) -> Result<ResolvedAnswer, DomainError> {
        if let Some(answer) = self.match_manual_qa(tenant_id, query).await? {
            return Ok(ResolvedAnswer::manual_qa(answer));
        }

        let sampled = self
            .vector_store
            .sample_payloads(tenant_id, PROBE_LIMIT)
            .await?;
        if sampled.is_empty() {
            tracing::debug!(tenant_id = %tenant_id, "no stored points for tenant");
            return Ok(ResolvedAnswer::no_context());
        }
        let text_key = choose_text_key(&sampled);

        let contexts = self.retrieve_contexts(tenant_id, query, text_key).await?;
        if contexts.is_empty() {
            return Ok(ResolvedAnswer::no_context());
        }

        let completion = self.synthesize(query, &contexts).await?;
        Ok(ResolvedAnswer::from_documents(completion))
    }

    /// Stage 1: case-insensitive containment against stored questions, most
    /// recent entry first.
    async fn match_manual_qa(
        &self,
        tenant_id: &TenantId,
        query: &str,
    ) -> Result<Option<String>, DomainError> {
        let normalized = query.trim().to_lowercase();
        if normalized.is_empty() {
            return Ok(None);
        }

        let pairs = self.knowledge_store.list_manual_qa(tenant_id).await?;
        for qa in pairs {
            let stored = qa.question.trim().to_lowercase();
            if stored.is_empty() {
                continue;
            }
            if normalized.contains(&stored) || stored.contains(&normalized) {
                tracing::debug!(tenant_id = %tenant_id, question = %qa.question, "manual QA match");
                return Ok(Some(qa.answer));
            }
        }

        Ok(None)
    }

    /// Stages 2b-3: embed the query, search tenant-scoped, keep hits whose
    /// chosen payload key holds non-empty text.
    async fn retrieve_contexts(
        &self,
        tenant_id: &TenantId,
        query: &str,
        text_key: &str,
    ) -> Result<Vec<String>, DomainError> {
        let vectors = self.embedding.embed(&[query.to_string()]).await?;
        let query_vector = vectors
            .into_iter()
            .next()
            .ok_or_else(|| DomainError::embedding_service("Embedding response was empty"))?;

        let hits = self
            .vector_store
            .search(tenant_id, &query_vector, TOP_K)
            .await?;

        let retrieved = hits.len();
        let contexts: Vec<String> = hits
            .into_iter()
            .filter_map(|hit| {
                hit.payload
                    .get(text_key)
                    .and_then(|v| v.as_str())
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
            })
            .collect();

        let skipped = retrieved - contexts.len();
        if skipped > 0 {
            tracing::warn!(
                tenant_id = %tenant_id,
                skipped,
                text_key,
                "dropped hits with missing or empty text payload"
            );
        }

        Ok(contexts)
    }

    /// Stage 4: hand the retrieved context and the question to the model.
    async fn synthesize(&self, query: &str, contexts: &[String]) -> Result<String, DomainError> {
        let context = contexts.join("\n\n");
        let system = format!(
            "{}\n\nContext:\n{}\n\n{}",
            SYSTEM_PROMPT_HEADER, context, SYSTEM_PROMPT_FOOTER
        );

        let messages = [ChatMessage::system(system), ChatMessage::user(query)];
        self.llm.complete(&messages).await
    }
}

/// First preference-list key holding non-empty text in any sampled payload.
/// Falls back to the key training writes.
fn choose_text_key(payloads: &[Payload]) -> &'static str {
    for key in TEXT_KEY_PREFERENCE {
        let holds_text = payloads.iter().any(|payload| {
            payload
                .get(key)
                .and_then(|v| v.as_str())
                .is_some_and(|s| !s.trim().is_empty())
        });
        if holds_text {
            return key;
        }
    }

    TEXT_PAYLOAD_KEY
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::embedding::mock::MockEmbeddingClient;
    use crate::domain::llm::mock::MockLanguageModel;
    use crate::domain::{
        ChatRole, ChunkRecord, InMemoryKnowledgeStore, ManualQa, Provenance, NO_CONTEXT_FALLBACK,
    };
    use crate::infrastructure::vector_store::InMemoryVectorStore;

    fn tenant(id: &str) -> TenantId {
        TenantId::new(id).unwrap()
    }

    struct Fixture {
        store: Arc<InMemoryKnowledgeStore>,
        embedding: Arc<MockEmbeddingClient>,
        vectors: Arc<InMemoryVectorStore>,
        llm: Arc<MockLanguageModel>,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                store: Arc::new(InMemoryKnowledgeStore::new()),
                embedding: Arc::new(MockEmbeddingClient::new(8)),
                vectors: Arc::new(InMemoryVectorStore::new()),
                llm: Arc::new(MockLanguageModel::new("synthesized answer")),
            }
        }

        fn with_store(mut self, store: InMemoryKnowledgeStore) -> Self {
            self.store = Arc::new(store);
            self
        }

        fn with_llm(mut self, llm: MockLanguageModel) -> Self {
            self.llm = Arc::new(llm);
            self
        }

        fn resolver(&self) -> AnswerResolver {
            AnswerResolver::new(
                self.store.clone(),
                self.embedding.clone(),
                self.vectors.clone(),
                self.llm.clone(),
            )
        }

        async fn index_chunk(&self, tenant_id: &TenantId, text: &str) {
            let record = ChunkRecord::new(
                tenant_id.clone(),
                self.embedding.vector_for(text),
                text,
            );
            self.vectors.upsert(&[record]).await.unwrap();
        }
    }

    #[tokio::test]
    async fn test_manual_qa_short_circuits_before_retrieval() {
        let t = tenant("acme");
        let fixture = Fixture::new().with_store(InMemoryKnowledgeStore::new().with_manual_qa(
            ManualQa::new(t.clone(), "hours", "We are open nine to five."),
        ));
        let resolver = fixture.resolver();

        let resolved = resolver.answer(&t, "What are your hours?").await;

        assert_eq!(resolved.provenance, Provenance::ManualQa);
        assert_eq!(resolved.answer, "We are open nine to five.");
        assert_eq!(fixture.embedding.calls(), 0);
        assert_eq!(fixture.llm.calls(), 0);
    }

    #[tokio::test]
    async fn test_manual_qa_matches_when_stored_question_contains_query() {
        let t = tenant("acme");
        let fixture = Fixture::new().with_store(InMemoryKnowledgeStore::new().with_manual_qa(
            ManualQa::new(t.clone(), "What are your opening hours?", "Nine to five."),
        ));

        let resolved = fixture.resolver().answer(&t, "opening hours").await;

        assert_eq!(resolved.provenance, Provenance::ManualQa);
        assert_eq!(resolved.answer, "Nine to five.");
    }

    #[tokio::test]
    async fn test_empty_knowledge_base_returns_fixed_fallback() {
        let t = tenant("acme");
        let fixture = Fixture::new();
        let resolver = fixture.resolver();

        let resolved = resolver.answer(&t, "anything at all").await;

        assert_eq!(resolved.provenance, Provenance::None);
        assert_eq!(resolved.answer, NO_CONTEXT_FALLBACK);
        assert_eq!(fixture.embedding.calls(), 0);
        assert_eq!(fixture.llm.calls(), 0);
    }

    #[tokio::test]
    async fn test_retrieval_feeds_context_to_the_model() {
        let t = tenant("acme");
        let fixture = Fixture::new();
        fixture.index_chunk(&t, "Our store opens at nine in the morning.").await;
        let resolver = fixture.resolver();

        let resolved = resolver.answer(&t, "When do you open?").await;

        assert_eq!(resolved.provenance, Provenance::Documents);
        assert_eq!(resolved.answer, "synthesized answer");

        let messages = fixture.llm.last_messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, ChatRole::System);
        assert!(messages[0].content.contains("Our store opens at nine in the morning."));
        assert_eq!(messages[1].role, ChatRole::User);
        assert_eq!(messages[1].content, "When do you open?");
    }

    #[tokio::test]
    async fn test_query_never_crosses_tenants() {
        let a = tenant("acme");
        let b = tenant("globex");
        let fixture = Fixture::new();
        fixture.index_chunk(&b, "Globex confidential roadmap.").await;
        let resolver = fixture.resolver();

        let resolved = resolver.answer(&a, "What is the roadmap?").await;

        assert_eq!(resolved.provenance, Provenance::None);
        assert_eq!(resolved.answer, NO_CONTEXT_FALLBACK);
        assert_eq!(fixture.llm.calls(), 0);
    }

    #[tokio::test]
    async fn test_llm_outage_resolves_to_error_provenance() {
        let t = tenant("acme");
        let fixture = Fixture::new()
            .with_llm(MockLanguageModel::new("unused").with_error("upstream timed out"));
        fixture.index_chunk(&t, "Some indexed knowledge.").await;

        let resolved = fixture.resolver().answer(&t, "a question").await;

        assert_eq!(resolved.provenance, Provenance::Error);
        assert!(resolved.answer.starts_with("Error:"));
        assert!(resolved.answer.contains("upstream timed out"));
    }

    #[tokio::test]
    async fn test_hits_with_empty_text_are_dropped() {
        let t = tenant("acme");
        let fixture = Fixture::new();
        fixture
            .vectors
            .insert_raw(
                "blank",
                fixture.embedding.vector_for("whatever"),
                serde_json::json!({"tenant_id": "acme", "text": "   "})
                    .as_object()
                    .unwrap()
                    .clone(),
            )
            .await;

        let resolved = fixture.resolver().answer(&t, "a question").await;

        assert_eq!(resolved.provenance, Provenance::None);
        assert_eq!(resolved.answer, NO_CONTEXT_FALLBACK);
        assert_eq!(fixture.llm.calls(), 0);
    }

    #[tokio::test]
    async fn test_probe_adapts_to_legacy_payload_key() {
        let t = tenant("acme");
        let fixture = Fixture::new();
        fixture
            .vectors
            .insert_raw(
                "legacy",
                fixture.embedding.vector_for("Shipping takes two days."),
                serde_json::json!({"tenant_id": "acme", "page_content": "Shipping takes two days."})
                    .as_object()
                    .unwrap()
                    .clone(),
            )
            .await;

        let resolved = fixture.resolver().answer(&t, "How long is shipping?").await;

        assert_eq!(resolved.provenance, Provenance::Documents);
        let messages = fixture.llm.last_messages();
        assert!(messages[0].content.contains("Shipping takes two days."));
    }

    #[test]
    fn test_choose_text_key_prefers_list_order() {
        let payload = serde_json::json!({"content": "c", "text": "t"})
            .as_object()
            .unwrap()
            .clone();

        assert_eq!(choose_text_key(&[payload]), "text");
    }

    #[test]
    fn test_choose_text_key_defaults_to_canonical() {
        let payload = serde_json::json!({"tenant_id": "acme"})
            .as_object()
            .unwrap()
            .clone();

        assert_eq!(choose_text_key(&[payload]), TEXT_PAYLOAD_KEY);
    }
}
