use std::collections::{BTreeMap, HashSet};

use super::builder::RequestDescriptor;

/// Header filters configured under `import` in curlhop.json. Browser "copy as
/// cURL" output carries a lot of noise (`sec-ch-*`, cookies) that operators
/// usually strip before replaying against another service.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeaderRules {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub append: BTreeMap<String, String>,
}

impl HeaderRules {
    pub fn is_empty(&self) -> bool {
        self.include.is_empty() && self.exclude.is_empty() && self.append.is_empty()
    }

    /// Returns a new descriptor with the rules applied.
    pub fn apply(&self, request: &RequestDescriptor) -> RequestDescriptor {
        if self.is_empty() {
            return request.clone();
        }
        RequestDescriptor {
            headers: apply_header_rules(
                request.headers.clone(),
                &self.include,
                &self.exclude,
                &self.append,
            ),
            ..request.clone()
        }
    }
}

/// Header names compared without regard to case.
struct NameSet(HashSet<String>);

impl NameSet {
    fn of<'a>(names: impl IntoIterator<Item = &'a String>) -> Self {
        Self(names.into_iter().map(|n| n.to_ascii_lowercase()).collect())
    }

    fn has(&self, name: &str) -> bool {
        self.0.contains(&name.to_ascii_lowercase())
    }
}

/// Keeps the headers named in `include` (all of them when it is empty), drops
/// those named in `exclude`, then adds each `append` entry the request does
/// not already carry. Order of the surviving headers is kept.
pub fn apply_header_rules(
    mut headers: Vec<(String, String)>,
    include: &[String],
    exclude: &[String],
    append: &BTreeMap<String, String>,
) -> Vec<(String, String)> {
    let wanted = NameSet::of(include);
    let unwanted = NameSet::of(exclude);
    headers.retain(|(name, _)| {
        (include.is_empty() || wanted.has(name)) && !unwanted.has(name)
    });

    let mut sent = NameSet::of(headers.iter().map(|(name, _)| name));
    for (name, value) in append {
        if !sent.has(name) {
            sent.0.insert(name.to_ascii_lowercase());
            headers.push((name.clone(), value.clone()));
        }
    }
    headers
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::split_url;
    use pretty_assertions::assert_eq;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(n, v)| (n.to_string(), v.to_string()))
            .collect()
    }

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn browser_noise_is_stripped_case_insensitively() {
        let copied = pairs(&[
            ("accept", "application/json"),
            ("sec-ch-ua", "\"Chromium\";v=\"124\""),
            ("Cookie", "session=abc"),
            ("Authorization", "Bearer t"),
        ]);

        let kept = apply_header_rules(
            copied,
            &[],
            &names(&["SEC-CH-UA", "cookie"]),
            &BTreeMap::new(),
        );

        assert_eq!(
            kept,
            pairs(&[("accept", "application/json"), ("Authorization", "Bearer t")])
        );
    }

    #[test]
    fn allow_list_wins_over_everything_not_named() {
        let copied = pairs(&[
            ("User-Agent", "Mozilla/5.0"),
            ("authorization", "Bearer t"),
            ("Referer", "https://app.example/"),
            ("Content-Type", "application/json"),
        ]);

        let kept = apply_header_rules(
            copied,
            &names(&["Authorization", "content-type", "Referer"]),
            &names(&["referer"]),
            &BTreeMap::new(),
        );

        assert_eq!(
            kept,
            pairs(&[("authorization", "Bearer t"), ("Content-Type", "application/json")])
        );
    }

    #[test]
    fn tenant_header_is_appended_unless_already_sent() {
        let mut append = BTreeMap::new();
        append.insert("X-Tenant".to_string(), "acme".to_string());
        append.insert("X-Debug".to_string(), "1".to_string());

        let without = apply_header_rules(pairs(&[("Accept", "*/*")]), &[], &[], &append);
        assert_eq!(
            without,
            pairs(&[("Accept", "*/*"), ("X-Debug", "1"), ("X-Tenant", "acme")])
        );

        let with = apply_header_rules(pairs(&[("x-tenant", "globex")]), &[], &[], &append);
        assert_eq!(with, pairs(&[("x-tenant", "globex"), ("X-Debug", "1")]));
    }

    #[test]
    fn empty_rules_leave_the_request_untouched() {
        let request = RequestDescriptor {
            method: "GET".to_string(),
            url: "https://api.example.com/x".to_string(),
            headers: pairs(&[("Cookie", "a=b")]),
            body: None,
            source: split_url("https://api.example.com/x").unwrap(),
        };
        assert!(HeaderRules::default().is_empty());
        assert_eq!(HeaderRules::default().apply(&request), request);

        let rules = HeaderRules {
            exclude: names(&["cookie"]),
            ..HeaderRules::default()
        };
        assert!(rules.apply(&request).headers.is_empty());
        assert_eq!(rules.apply(&request).url, request.url);
    }
}
