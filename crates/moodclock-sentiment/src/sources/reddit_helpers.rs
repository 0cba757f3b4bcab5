//! Reddit listing shapes and post-to-text conversion.

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(super) struct TokenResponse {
    pub(super) access_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct Listing {
    #[serde(default)]
    pub(super) data: ListingData,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct ListingData {
    #[serde(default)]
    pub(super) children: Vec<Post>,
}

#[derive(Debug, Deserialize)]
pub(super) struct Post {
    #[serde(default)]
    pub(super) data: PostData,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct PostData {
    pub(super) title: Option<String>,
    pub(super) selftext: Option<String>,
}

/// Subreddits polled for hot titles: `r/{cc}news` then `r/{cc}`.
pub(super) fn country_subreddits(country_code: &str) -> [String; 2] {
    let cc = country_code.to_ascii_lowercase();
    [format!("{cc}news"), cc]
}

/// Non-empty post titles, in listing order.
pub(super) fn hot_titles(listing: Listing) -> Vec<String> {
    listing
        .data
        .children
        .into_iter()
        .filter_map(|post| post.data.title)
        .filter(|title| !title.trim().is_empty())
        .collect()
}

/// `title selftext`, trimmed; posts with neither are skipped.
pub(super) fn post_texts(listing: Listing) -> Vec<String> {
    listing
        .data
        .children
        .into_iter()
        .filter_map(|post| {
            let title = post.data.title.unwrap_or_default();
            let body = post.data.selftext.unwrap_or_default();
            let combined = format!("{title} {body}").trim().to_string();
            (!combined.is_empty()).then_some(combined)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(json: &str) -> Listing {
        serde_json::from_str(json).expect("valid listing json")
    }

    #[test]
    fn subreddits_are_lowercased() {
        assert_eq!(country_subreddits("GB"), ["gbnews".to_string(), "gb".to_string()]);
    }

    #[test]
    fn post_text_joins_title_and_body() {
        let l = listing(
            r#"{"data":{"children":[
                {"data":{"title":"Budget vote","selftext":"Parliament sits late"}},
                {"data":{"title":"Only a title","selftext":""}},
                {"data":{"title":null,"selftext":null}},
                {"data":{}}
            ]}}"#,
        );
        assert_eq!(
            post_texts(l),
            vec!["Budget vote Parliament sits late", "Only a title"]
        );
    }

    #[test]
    fn hot_titles_skip_blank_titles() {
        let l = listing(
            r#"{"data":{"children":[
                {"data":{"title":"Storm warning"}},
                {"data":{"title":"   "}},
                {"data":{"selftext":"no title"}}
            ]}}"#,
        );
        assert_eq!(hot_titles(l), vec!["Storm warning"]);
    }

    #[test]
    fn missing_data_parses_as_empty_listing() {
        assert!(post_texts(listing("{}")).is_empty());
    }
}
