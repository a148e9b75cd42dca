//! Record-set discovery
//!
//! Pages through a hosted zone's record sets looking for one (name, type)
//! pair. Route 53 returns names fully qualified with a trailing dot, so both
//! sides of the comparison are normalized first.
//!
//! The first structural match wins. That is correct only because a
//! (name, type) pair is unique within a zone; the listing order itself is
//! not relied on.

use tracing::debug;

use crate::error::{Error, Result};
use crate::traits::{PageToken, ResourceRecordSet, Route53Api};

/// Strip a single trailing dot
pub fn trim_trailing_dot(name: &str) -> &str {
    name.strip_suffix('.').unwrap_or(name)
}

/// Find the record set with the given name and type
///
/// # Returns
///
/// - `Ok(Some(rrs))`: The first matching record set
/// - `Ok(None)`: The listing was exhausted without a match
/// - `Err(Error::Listing)`: A page could not be fetched; nothing partial is returned
pub async fn find_record_set(
    route53: &dyn Route53Api,
    hosted_zone_id: &str,
    name: &str,
    record_type: &str,
) -> Result<Option<ResourceRecordSet>> {
    let find_name = trim_trailing_dot(name);
    let mut start: Option<PageToken> = None;
    let mut page_count = 0usize;

    loop {
        page_count += 1;
        let page = route53
            .list_resource_record_sets(hosted_zone_id, start.as_ref())
            .await
            .map_err(|e| Error::listing(hosted_zone_id, e.to_string()))?;

        debug!(
            zone = hosted_zone_id,
            page = page_count,
            records_in_page = page.resource_record_sets.len(),
            "Fetched record-set page"
        );

        for rrs in page.resource_record_sets {
            debug!("Found DNS resource {:?} {:?}", rrs.record_type, rrs.name);

            if rrs.record_type != record_type {
                continue;
            }
            if trim_trailing_dot(&rrs.name) == find_name {
                return Ok(Some(rrs));
            }
        }

        match page.next {
            Some(next) => {
                if start.as_ref() == Some(&next) {
                    return Err(Error::listing(
                        hosted_zone_id,
                        format!(
                            "pagination did not advance past {} {}",
                            next.start_record_name, next.start_record_type
                        ),
                    ));
                }
                start = Some(next);
            }
            None => break,
        }
    }

    debug!(
        zone = hosted_zone_id,
        pages = page_count,
        "No record set matched {} {}",
        find_name,
        record_type
    );
    Ok(None)
}
