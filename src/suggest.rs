//! Query suggestion from detected risk markers.
//!
//! Maps each risk type found in a document to a small set of stock
//! questions a reviewer would plausibly ask next, ordered so that
//! high-weight findings drive the first suggestions.

use crate::models::RiskItem;

/// Upper bound on returned suggestions.
const MAX_SUGGESTIONS: usize = 8;

/// Returned when no risk marker maps to a template.
const FALLBACK_QUERIES: [&str; 2] = [
    "What are the key obligations of each party?",
    "How can this agreement be terminated?",
];

/// Stock questions per risk type. Keys match the risk taxonomy.
fn templates_for(kind: &str) -> &'static [&'static str] {
    match kind {
        "termination" => &[
            "What are the conditions for termination?",
            "What notice period is required for termination?",
        ],
        "penalty" => &["What penalties apply on breach or late performance?"],
        "breach" => &[
            "What constitutes a material breach?",
            "What remedies are available on breach?",
        ],
        "liability" => &[
            "Is there a cap on liability?",
            "What liabilities are excluded?",
        ],
        "non-compete" => &["What is the scope and duration of the non-compete?"],
        "renewal" => &[
            "Does this agreement renew automatically?",
            "How can renewal be declined?",
        ],
        "confidentiality" => &[
            "What information is covered by confidentiality?",
            "How long do confidentiality obligations last?",
        ],
        "indemnity" => &["Who indemnifies whom, and for what claims?"],
        "payment terms" => &[
            "What are the payment terms and due dates?",
            "What happens on late payment?",
        ],
        "jurisdiction" => &["Which courts have jurisdiction over disputes?"],
        "governing law" => &["Which law governs this agreement?"],
        "notice period" => &["How must notices be delivered and how long in advance?"],
        "service clauses" => &["What service levels are guaranteed?"],
        _ => &[],
    }
}

/// Turns risk findings into suggested queries.
///
/// Risks are visited in descending weight order (stable within a tier),
/// each contributing its template questions. Duplicates are dropped and
/// the list is capped at [`MAX_SUGGESTIONS`]. When nothing maps, a
/// generic fallback pair is returned so callers always have something
/// to offer.
pub fn suggest_queries(risks: &[RiskItem]) -> Vec<String> {
    let mut ordered: Vec<&RiskItem> = risks.iter().collect();
    ordered.sort_by_key(|r| std::cmp::Reverse(r.weight.rank()));

    let mut out: Vec<String> = Vec::new();
    for risk in ordered {
        for query in templates_for(&risk.kind) {
            if out.iter().any(|existing| existing == query) {
                continue;
            }
            out.push((*query).to_string());
            if out.len() == MAX_SUGGESTIONS {
                return out;
            }
        }
    }

    if out.is_empty() {
        out.extend(FALLBACK_QUERIES.iter().map(|q| (*q).to_string()));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RiskWeight;

    fn risk(kind: &str, weight: RiskWeight) -> RiskItem {
        RiskItem {
            kind: kind.to_string(),
            weight,
            context: String::new(),
        }
    }

    #[test]
    fn test_high_weight_risks_drive_first_suggestions() {
        let risks = vec![
            risk("jurisdiction", RiskWeight::Low),
            risk("termination", RiskWeight::High),
        ];
        let queries = suggest_queries(&risks);
        assert_eq!(queries[0], "What are the conditions for termination?");
        assert!(queries.contains(&"Which courts have jurisdiction over disputes?".to_string()));
    }

    #[test]
    fn test_duplicate_risks_suggest_once() {
        let risks = vec![
            risk("renewal", RiskWeight::Medium),
            risk("renewal", RiskWeight::Medium),
        ];
        let queries = suggest_queries(&risks);
        let hits = queries
            .iter()
            .filter(|q| q.as_str() == "Does this agreement renew automatically?")
            .count();
        assert_eq!(hits, 1);
    }

    #[test]
    fn test_capped_at_max_suggestions() {
        let risks = vec![
            risk("termination", RiskWeight::High),
            risk("breach", RiskWeight::High),
            risk("liability", RiskWeight::High),
            risk("renewal", RiskWeight::Medium),
            risk("confidentiality", RiskWeight::Medium),
            risk("payment terms", RiskWeight::Medium),
            risk("jurisdiction", RiskWeight::Low),
        ];
        let queries = suggest_queries(&risks);
        assert_eq!(queries.len(), MAX_SUGGESTIONS);
    }

    #[test]
    fn test_fallback_when_no_risks() {
        let queries = suggest_queries(&[]);
        assert_eq!(
            queries,
            vec![
                "What are the key obligations of each party?".to_string(),
                "How can this agreement be terminated?".to_string(),
            ]
        );
    }

    #[test]
    fn test_fallback_when_no_template_matches() {
        let risks = vec![risk("unheard-of", RiskWeight::High)];
        let queries = suggest_queries(&risks);
        assert_eq!(queries.len(), 2);
        assert_eq!(queries[0], "What are the key obligations of each party?");
    }

    #[test]
    fn test_stable_within_same_weight() {
        let risks = vec![
            risk("breach", RiskWeight::High),
            risk("liability", RiskWeight::High),
        ];
        let queries = suggest_queries(&risks);
        assert_eq!(queries[0], "What constitutes a material breach?");
        assert_eq!(queries[2], "Is there a cap on liability?");
    }
}
