/// Retrieval synthesis template.
/// Replace: {context}, {question}
pub const ANSWER_FROM_CONTEXT_TEMPLATE: &str = r#"Use the following career documents to answer the question at the end.
Only use facts present in the documents. If the documents do not cover the question, say so briefly.

DOCUMENTS:
{context}

QUESTION: {question}

Answer with the full set of duties, skills, tools, education and experience requirements you find."#;
