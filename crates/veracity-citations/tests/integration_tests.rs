//! Integration tests for veracity-citations

use veracity_citations::{
    Citation, CitationConfig, CitationKind, CitationValidator, ClaimKind, MatchedSource, CITATION_REMOVED_MARKER,
};
use veracity_domain::{Competitor, ExternalSource, KbDocument, SourceCorpus};

fn corpus() -> SourceCorpus {
    SourceCorpus::new()
        .with_document(
            KbDocument::new("doc-a91", "Acme Analytics reported revenue of $48.2M for fiscal 2024.")
                .with_title("Acme FY2024 10-K"),
        )
        .with_document(KbDocument::new("doc-b17", "Acme Analytics employs roughly 420 people."))
        .with_document(
            KbDocument::new("doc-c03", "Revenue grew 20% year over year on enterprise demand.")
                .with_notes("Figure confirmed on the Q4 earnings call."),
        )
        .with_competitor(Competitor::new(12, "Acme Analytics").with_description("Mid-market BI vendor."))
        .with_competitor(Competitor::new(13, "Globex"))
        .with_external_source(
            ExternalSource::new("https://www.gartner.com/reports/bi-2024", "Gartner")
                .with_content("Acme Analytics is ranked #3 among mid-market BI vendors."),
        )
}

#[test]
fn test_kb_citation_by_ordinal() {
    let validator = CitationValidator::with_defaults(corpus()).unwrap();
    let result = validator.validate("Revenue grew 20% [Source: KB-3].", None);

    assert_eq!(result.valid_citations.len(), 1);
    assert_eq!(result.valid_citations[0].source_reference, "KB-3");
    assert!(matches!(
        &result.valid_citations[0].matched_source,
        Some(MatchedSource::KnowledgeBase(doc)) if doc.id == "doc-c03"
    ));
    assert!(result.is_valid);
    assert_eq!(result.citation_accuracy(), 1.0);
}

#[test]
fn test_missing_kb_document_is_removed() {
    let small = SourceCorpus::new().with_document(KbDocument::new("only", "One document."));
    let validator = CitationValidator::with_defaults(small).unwrap();
    let result = validator.validate("Revenue grew 20% [Source: KB-3].", None);

    assert!(!result.is_valid);
    assert_eq!(result.invalid_citations.len(), 1);
    assert_eq!(result.cleaned_response, format!("Revenue grew 20% {}.", CITATION_REMOVED_MARKER));
    assert!(result.warnings.iter().any(|w| w.contains("KB-3")));
    assert_eq!(result.citation_accuracy(), 0.0);
}

#[test]
fn test_unsourced_versus_cited_revenue() {
    let validator = CitationValidator::with_defaults(corpus()).unwrap();

    let unsourced = validator.validate("Acme booked $5M in revenue last quarter.", None);
    assert!(!unsourced.is_valid);
    assert_eq!(unsourced.unsourced_claims.len(), 1);
    assert_eq!(unsourced.unsourced_claims[0].kind, ClaimKind::DollarAmount);

    let cited = validator.validate("Acme booked $5M in revenue [Source: KB-1] last quarter.", None);
    assert!(cited.is_valid);
    assert!(cited.unsourced_claims.is_empty());
}

#[test]
fn test_mixed_answer() {
    let validator = CitationValidator::with_defaults(corpus()).unwrap();
    let answer = "According to Gartner, Acme Analytics is ranked #3 in its segment. \
                  The company has about 420 employees [Source: doc-b17]. \
                  Analysts expect the product line to keep expanding into adjacent markets over the coming years. \
                  Per Initech Research, churn fell to 4% (Source: Initech Research).";

    let result = validator.validate(answer, None);

    let valid_kinds: Vec<CitationKind> = result.valid_citations.iter().map(|c| c.kind).collect();
    assert!(valid_kinds.contains(&CitationKind::AccordingTo));
    assert!(valid_kinds.contains(&CitationKind::SourceNamed));
    assert_eq!(result.invalid_citations.len(), 2);
    assert!(!result.is_valid);
    assert!(!result.cleaned_response.contains("Initech"));
    assert!(result.cleaned_response.contains("According to Gartner"));

    // The 4% claim sits next to citations, but none of them resolved
    assert_eq!(result.unsourced_claims.len(), 1);
    assert_eq!(result.unsourced_claims[0].text, "4%");
}

#[test]
fn test_low_confidence_does_not_invalidate() {
    let validator = CitationValidator::with_defaults(corpus()).unwrap();
    let citations = vec![
        Citation::new("Acme FY2024 10-K").with_quote("Acme Analytics reported revenue of $48.2M for fiscal 2024"),
        Citation::new("Globex").with_quote("Globex is headquartered in Springfield"),
        Citation::new("doc-b17").with_quote("Board approved a new stock buyback plan"),
    ];

    let result = validator.validate("See the attached sources.", Some(&citations));

    assert!(result.is_valid);
    assert_eq!(result.valid_citations.len(), 3);
    let flagged: Vec<&str> = result
        .low_confidence_citations()
        .map(|c| c.source_reference.as_str())
        .collect();
    assert_eq!(flagged, vec!["doc-b17"]);
    assert_eq!(result.warnings.len(), 1);
}

#[test]
fn test_invalid_structured_citation_fails_validation() {
    let validator = CitationValidator::with_defaults(corpus()).unwrap();
    let citations = vec![Citation::new("Bloomberg Terminal")];
    let result = validator.validate("No figures here.", Some(&citations));

    assert!(!result.is_valid);
    assert_eq!(result.invalid_citations[0].kind, CitationKind::Structured);
}

#[test]
fn test_strict_preset_rejects_generic_references() {
    let text = "Acme is growing (Source: internal database).";

    let default = CitationValidator::with_defaults(corpus()).unwrap().validate(text, None);
    assert!(default.is_valid);

    let strict = CitationValidator::new(corpus(), CitationConfig::strict())
        .unwrap()
        .validate(text, None);
    assert!(!strict.is_valid);
    assert_eq!(strict.cleaned_response, "Acme is growing [citation removed].");
}

#[test]
fn test_custom_marker_from_toml() {
    let config = CitationConfig::from_toml(
        r#"
        low_similarity_threshold = 0.3
        claim_window = 100
        max_unsourced_claims = 5
        deep_check_min_words = 5
        deep_check_coverage = 0.8
        removal_marker = "[unverified]"
        "#,
    )
    .unwrap();
    let validator = CitationValidator::new(corpus(), config).unwrap();

    let result = validator.validate("Sales doubled [9].", None);
    assert_eq!(result.cleaned_response, "Sales doubled [unverified].");
}

#[test]
fn test_deep_check_against_notes() {
    let validator = CitationValidator::with_defaults(corpus()).unwrap();
    let citation = Citation::new("doc-c03").with_quote("figure confirmed on the Q4 earnings call");
    assert!(validator.validate_citation_references_real_content(&citation, ""));
}

#[test]
fn test_result_serializes() {
    let validator = CitationValidator::with_defaults(corpus()).unwrap();
    let result = validator.validate("Up 20% [Source: KB-3] and [Source: KB-9].", None);

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["is_valid"], false);
    assert_eq!(json["valid_citations"][0]["kind"], "source_named");
    assert_eq!(json["valid_citations"][0]["matched_source"]["type"], "knowledge_base");
    assert_eq!(json["invalid_citations"][0]["source_reference"], "KB-9");
}

#[test]
fn test_narrative_citation_stops_at_source_name() {
    let validator = CitationValidator::with_defaults(corpus()).unwrap();
    let text = "According to Gartner the market grew quickly last year.";
    let result = validator.validate(text, None);

    assert!(result.is_valid);
    assert_eq!(result.valid_citations[0].source_reference, "Gartner");
    assert_eq!(result.cleaned_response, text);

    let result = validator.validate("According to industry analysts the market grew quickly last year.", None);
    assert!(!result.is_valid);
    assert_eq!(result.cleaned_response, "[citation removed] the market grew quickly last year.");
}
