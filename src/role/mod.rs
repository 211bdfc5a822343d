//! System-role text for plan generation requests.

use crate::dataset::Dataset;

/// Role sent with every plan-generation request: the dataset schema plus the
/// JSON contract the reply must follow. The model sees the schema, never rows.
pub fn plan_role_text(data: &Dataset) -> String {
    format!(
        "You are a data analyst assistant.\n\
         The dataset has {rows} rows with columns: {schema}.\n\
         Translate the user's request into exactly one JSON object and output nothing else.\n\
         Provide only plain text without Markdown formatting.\n\
         Do not provide markdown formatting such as ```.\n\
         Allowed objects:\n\
         {{\"op\":\"describe\"}}\n\
         {{\"op\":\"head\",\"n\":<int>}}\n\
         {{\"op\":\"shape\"}}\n\
         {{\"op\":\"value_counts\",\"column\":<name>}}\n\
         {{\"op\":\"aggregate\",\"column\":<name>,\"stat\":<count|mean|std|min|max|sum>}}\n\
         {{\"op\":\"group_aggregate\",\"by\":<name>,\"column\":<name>,\"stat\":<count|mean|std|min|max|sum>}}\n\
         Column names must be taken verbatim from the schema above.\n\
         If the request cannot be expressed with these operations, output an empty reply.",
        rows = data.rows(),
        schema = data.schema_text(),
    )
}
