//! Decides which requested packages the destination already satisfies.

use std::collections::BTreeMap;

use log::{debug, warn};

use crate::index::{IndexClient, IndexError};
use crate::request::RequestSet;
use crate::version::select_best;

/// Checks, per request, whether the destination already holds a version
/// satisfying it.
///
/// A project the destination does not know counts as absent. Any other
/// query failure is logged and counts as absent too, so the package
/// still gets a sync attempt.
pub async fn check_presence(
    requests: &RequestSet,
    destination: &dyn IndexClient,
) -> BTreeMap<String, bool> {
    let mut presence = BTreeMap::new();

    for request in requests.iter() {
        let present = match destination.list_versions(&request.name).await {
            Ok(versions) => {
                select_best(&request.specifiers, versions.iter().map(String::as_str)).is_some()
            }
            Err(IndexError::NotFound(_)) => false,
            Err(err) => {
                warn!(
                    "Could not check {} on {}: {}",
                    request.name,
                    destination.index_url(),
                    err
                );
                false
            }
        };

        debug!("{} already present: {}", request, present);
        presence.insert(request.name.clone(), present);
    }

    presence
}
