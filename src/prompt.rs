/// Sentence the model must answer with when the document does not contain
/// the answer. Callers may compare responses against it verbatim.
pub const REFUSAL_SENTENCE: &str = "I could not find this information in the document.";

const DOCUMENT_HEADER: &str = "--- DOCUMENT TEXT ---";
const DOCUMENT_FOOTER: &str = "-------------------------";
const QUESTION_HEADER: &str = "--- USER QUESTION ---";

/// Builds the grounding prompt. Pure: identical inputs give byte-identical output.
pub fn build_prompt(document_text: &str, question: &str) -> String {
    format!(
        "Answer the user's question based EXCLUSIVELY on the following text \
         extracted from a document.\n\
         If the answer is not contained in the text, reply exactly: \"{REFUSAL_SENTENCE}\"\n\
         Do not use any outside knowledge.\n\
         \n\
         {DOCUMENT_HEADER}\n\
         {document_text}\n\
         {DOCUMENT_FOOTER}\n\
         \n\
         {QUESTION_HEADER}\n\
         {question}\n"
    )
}
