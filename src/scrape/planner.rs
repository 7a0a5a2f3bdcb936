//! Pagination planning
//!
//! A seed page reports the total listing count; the site shows a fixed number
//! of listings per page, so the remaining pages are addressed by 1-based
//! pointers `1 ..= ceil(total / page_size) - 1`. Pointer 0 is the seed itself.

use crate::ParseError;
use url::Url;

/// Additional page pointers needed to cover `total` listings
///
/// # Examples
///
/// ```
/// use shelter_scrape::scrape::plan;
///
/// assert!(plan(10, 10).is_empty());
/// assert_eq!(plan(25, 10), vec![1, 2]);
/// ```
pub fn plan(total: usize, page_size: usize) -> Vec<usize> {
    if page_size == 0 {
        return Vec::new();
    }
    let pages = total.div_ceil(page_size);
    (1..pages).collect()
}

/// Pagination decision for one seed URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationPlan {
    /// Count signal from the seed page, if it had one
    pub total: Option<usize>,
    pub page_size: usize,
    pointers: Vec<usize>,
}

impl PaginationPlan {
    /// Plans the additional pages of one seed
    ///
    /// Without a count signal the seed is taken as complete, which only holds
    /// while it lists fewer than `page_size` records. More than that means the
    /// count marker was missed and is reported instead of truncating.
    ///
    /// # Arguments
    ///
    /// * `seed_url` - URL of the seed page (for error reporting)
    /// * `total` - Count signal of the seed page
    /// * `listings` - Listings found on the seed page, malformed ones included
    /// * `page_size` - Listings per result page
    pub fn for_seed(
        seed_url: &Url,
        total: Option<usize>,
        listings: usize,
        page_size: usize,
    ) -> Result<Self, ParseError> {
        let pointers = match total {
            Some(total) => plan(total, page_size),
            None => {
                let limit = page_size.saturating_sub(1);
                if listings > limit {
                    return Err(ParseError::UnpaginatedOverflow {
                        page_url: seed_url.to_string(),
                        found: listings,
                        limit,
                    });
                }
                Vec::new()
            }
        };

        Ok(Self {
            total,
            page_size,
            pointers,
        })
    }

    /// Additional page pointers, increasing and gap-free
    pub fn pointers(&self) -> &[usize] {
        &self.pointers
    }

    pub fn is_empty(&self) -> bool {
        self.pointers.is_empty()
    }
}

/// URL of the page addressed by `pointer` below `seed`
pub fn page_url(seed: &Url, pointer_param: &str, pointer: usize) -> Url {
    let mut url = seed.clone();
    url.query_pairs_mut()
        .append_pair(pointer_param, &pointer.to_string());
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seed() -> Url {
        Url::parse("http://www.tierschutz-berlin.de/nc/tierheim/tiervermittlung/hunde.html")
            .unwrap()
    }

    #[test]
    fn test_plan_boundaries() {
        assert!(plan(0, 10).is_empty());
        assert!(plan(9, 10).is_empty());
        assert!(plan(10, 10).is_empty());
        assert_eq!(plan(11, 10), vec![1]);
        assert_eq!(plan(20, 10), vec![1]);
        assert_eq!(plan(21, 10), vec![1, 2]);
        assert_eq!(plan(25, 10), vec![1, 2]);
    }

    #[test]
    fn test_plan_length_matches_page_count() {
        for total in 0..250usize {
            let expected = total.div_ceil(10).saturating_sub(1);
            let pointers = plan(total, 10);
            assert_eq!(pointers.len(), expected, "total = {}", total);
            assert!(pointers.iter().copied().eq(1..=expected));
        }
    }

    #[test]
    fn test_seed_with_count_signal() {
        let plan = PaginationPlan::for_seed(&seed(), Some(34), 10, 10).unwrap();
        assert_eq!(plan.pointers(), &[1, 2, 3]);
        assert_eq!(plan.total, Some(34));
    }

    #[test]
    fn test_seed_without_signal_under_threshold() {
        let plan = PaginationPlan::for_seed(&seed(), None, 9, 10).unwrap();
        assert!(plan.is_empty());
        assert_eq!(plan.total, None);
    }

    #[test]
    fn test_seed_without_signal_over_threshold_is_error() {
        let err = PaginationPlan::for_seed(&seed(), None, 10, 10).unwrap_err();
        assert_eq!(
            err,
            ParseError::UnpaginatedOverflow {
                page_url: seed().to_string(),
                found: 10,
                limit: 9,
            }
        );
    }

    #[test]
    fn test_page_url_appends_pointer() {
        let url = page_url(&seed(), "tx_realty_pi1[pointer]", 2);
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();

        assert_eq!(url.path(), "/nc/tierheim/tiervermittlung/hunde.html");
        assert_eq!(
            pairs,
            vec![("tx_realty_pi1[pointer]".to_string(), "2".to_string())]
        );
    }

    #[test]
    fn test_page_url_keeps_existing_query() {
        let seed = Url::parse("http://example.com/list.html?sort=name").unwrap();
        let url = page_url(&seed, "page", 1);
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();

        assert_eq!(
            pairs,
            vec![
                ("sort".to_string(), "name".to_string()),
                ("page".to_string(), "1".to_string())
            ]
        );
    }
}
