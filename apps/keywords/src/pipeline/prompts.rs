// All LLM prompt constants for the keyword pipeline.
// Reuses cross-cutting fragments from llm_client::prompts.

/// Query sent to the corpus store. Replace `{role}` before sending.
pub const RETRIEVAL_QUERY_TEMPLATE: &str = "All requirements and description for role {role}";

/// Stage 1: flat keyword generation.
/// Replace: {num_keywords}, {role}, {description}
pub const GENERATE_PROMPT_TEMPLATE: &str = r#"Create a list of {num_keywords} ATS keywords associated with the given role.
The keywords should be as distinct and unique as possible, and no keyword in the list
may be an extension of another keyword (no shared prefix or suffix variants).
Do not include duplicates and do not repeat any keyword.
Use the given description of the role to get a better understanding of the role.

Role: {role}

Description: {description}"#;

/// Stage 2: cluster synonymous keywords into a Plan.
/// Replace: {keep_instruction}, {format_instructions}, {role}, {keywords}
pub const CLUSTER_PROMPT_TEMPLATE: &str = r#"From the given list of ATS keywords and role, cluster the keywords with the exact same meaning
into the same list. Use as many keywords as possible, and each nested list must represent a distinct meaning.
For the given list of keywords, create a 'Plan', which is a list of 'Item's where each Item is a list of
keywords with exactly the same meaning.
For example, given the list [l1, l2, l3, l4], if l1 and l2 have the same meaning and l3 and l4 also share
a meaning, the result is Plan: [Item_1: [l1, l2], Item_2: [l3, l4]].
{keep_instruction}

Role: {role}

Keywords: {keywords}

Format Instructions: {format_instructions}"#;

/// Stage 3: split Items that mix non-synonymous keywords.
/// Replace: {keep_instruction}, {format_instructions}, {role}, {curated_keywords}
pub const REFINE_PROMPT_TEMPLATE: &str = r#"You are given a nested list of ATS keywords for the given role. Make sure the keywords inside
each nested list have exactly the same meaning. If the keywords in an Item do not share the same meaning,
move the outlier into a new Item and append it to the Plan. Use as many keywords as possible, and each
Item must represent a distinct meaning.
For example, given Plan: [Item_1: [l1, l2], Item_2: [l3, l4], Item_3: [l5]], if l1 and l2 do not have
the same meaning, the refined result is Plan: [Item_1: [l1], Item_2: [l3, l4], Item_3: [l5], Item_4: [l2]].
{keep_instruction}

The input and output formats are the same.

Role: {role}

Keywords: {curated_keywords}

Format Instructions: {format_instructions}"#;

/// Machine-readable description of the Plan encoding accepted by `parser::parse_plan`.
pub const PLAN_FORMAT_INSTRUCTIONS: &str = r#"The output must be a single JSON object that conforms to the JSON schema below.

Here is the output schema:
```
{"type": "object", "properties": {"plan": {"type": "array", "items": {"type": "array", "items": {"type": "string", "minLength": 1}, "minItems": 1}, "minItems": 1}}, "required": ["plan"], "additionalProperties": false}
```

Example of a well-formatted instance:
{"plan": [["Machine Learning", "ML"], ["Python"]]}

Do NOT add any other keys. Every keyword must be a non-empty string and every inner list must contain at least one keyword."#;
