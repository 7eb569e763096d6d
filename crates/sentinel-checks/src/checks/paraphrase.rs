use async_trait::async_trait;
use sentinel_registry::{Check, CheckContext};
use sentinel_types::{CheckResult, CheckStatus};
use serde_json::{json, Value};
use std::collections::HashSet;

const ID: &str = "S3-paraphrase";
const SIMILARITY_THRESHOLD: f64 = 0.5;

struct Topic {
    name: &'static str,
    paraphrases: &'static [&'static str],
}

const TOPICS: &[Topic] = &[
    Topic {
        name: "deployment-region",
        paraphrases: &[
            "What region is the payments service deployed in?",
            "Tell me the payments service's deployment region.",
            "Which AWS region runs payments?",
        ],
    },
    Topic {
        name: "backup-retention",
        paraphrases: &[
            "How long do we retain quarterly backups?",
            "What's the backup retention period?",
            "For how many days are backups kept?",
        ],
    },
];

/// S3: for a small sample of topics, verifies retrieved result sets
/// overlap across paraphrases above a similarity threshold.
pub struct ParaphraseRobustnessCheck;

#[async_trait]
impl Check for ParaphraseRobustnessCheck {
    fn id(&self) -> &'static str {
        ID
    }

    async fn run(&self, ctx: &CheckContext) -> CheckResult {
        let start = std::time::Instant::now();
        let Ok(api_key) = ctx.credentials.require_api_key() else {
            return crate::common::credential_missing_result(ID);
        };
        let header = (ctx.credentials.header_name.as_str(), api_key);

        let mut topic_reports = Vec::new();
        let mut all_above_threshold = true;

        for topic in TOPICS {
            let mut result_sets: Vec<HashSet<String>> = Vec::new();
            for query in topic.paraphrases {
                let body = json!({ "query": query, "limit": 5 });
                let resp = match ctx
                    .client
                    .timed_post_with_header(&ctx.url("/tools/retrieve_context"), &body, ctx.timeout, Some(header))
                    .await
                {
                    Ok(resp) => resp,
                    Err(err) => return crate::common::transport_error_result(ID, err),
                };
                let parsed: Value = match resp.parse_json() {
                    Ok(v) => v,
                    Err(e) => {
                        return crate::common::internal_error_result(ID, "JsonParseError", e.to_string())
                    }
                };
                let ids: HashSet<String> = parsed
                    .get("results")
                    .and_then(Value::as_array)
                    .map(|arr| {
                        arr.iter()
                            .filter_map(|r| r.get("id").and_then(Value::as_str))
                            .map(String::from)
                            .collect()
                    })
                    .unwrap_or_default();
                result_sets.push(ids);
            }

            let overlap = pairwise_min_jaccard(&result_sets);
            if overlap < SIMILARITY_THRESHOLD {
                all_above_threshold = false;
            }
            topic_reports.push(json!({ "topic": topic.name, "overlap": overlap }));
        }

        let latency_ms = start.elapsed().as_millis() as u64;
        if all_above_threshold {
            CheckResult::new(
                ID,
                CheckStatus::Pass,
                latency_ms,
                "paraphrase result sets overlap sufficiently",
                json!({ "topics": topic_reports }),
            )
        } else {
            CheckResult::new(
                ID,
                CheckStatus::Fail,
                latency_ms,
                "paraphrase result sets diverge beyond threshold",
                json!({ "topics": topic_reports, "threshold": SIMILARITY_THRESHOLD }),
            )
        }
    }
}

fn pairwise_min_jaccard(sets: &[HashSet<String>]) -> f64 {
    let mut min = 1.0f64;
    for i in 0..sets.len() {
        for j in (i + 1)..sets.len() {
            let union = sets[i].union(&sets[j]).count();
            if union == 0 {
                continue;
            }
            let intersection = sets[i].intersection(&sets[j]).count();
            let jaccard = intersection as f64 / union as f64;
            min = min.min(jaccard);
        }
    }
    min
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jaccard_of_identical_sets_is_one() {
        let a: HashSet<String> = ["x".into(), "y".into()].into_iter().collect();
        let sets = vec![a.clone(), a];
        assert_eq!(pairwise_min_jaccard(&sets), 1.0);
    }

    #[test]
    fn jaccard_of_disjoint_sets_is_zero() {
        let a: HashSet<String> = ["x".into()].into_iter().collect();
        let b: HashSet<String> = ["y".into()].into_iter().collect();
        assert_eq!(pairwise_min_jaccard(&[a, b]), 0.0);
    }
}
