use distress_bedrock::extract::sanitize_document_name;

#[test]
fn keeps_allowed_characters() {
    assert_eq!(sanitize_document_name("intake-notes (v2).docx"), "intake-notes (v2)");
}

#[test]
fn collapses_disallowed_runs() {
    assert_eq!(sanitize_document_name("patient__visit...2024.docx"), "patient visit 2024");
}

#[test]
fn falls_back_when_nothing_remains() {
    assert_eq!(sanitize_document_name("___.docx"), "document");
    assert_eq!(sanitize_document_name(".docx"), "docx");
}
