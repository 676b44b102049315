//! Region listing derived from the identity service catalog.

use std::sync::Arc;

use crate::backend::{CatalogBackend, CatalogService};
use crate::error::{CloudError, check_limit};
use crate::paging::PagedResults;
use crate::resources::{Identified, Region};

/// Region operations.
///
/// Regions are not first-class backend resources: they are read off the
/// endpoints advertised in the service catalog. Every endpoint contributes
/// one region, so a region served by several services is listed once per
/// endpoint.
#[derive(Clone)]
pub struct RegionService {
    catalog: Arc<dyn CatalogBackend>,
}

impl RegionService {
    pub(crate) fn new(catalog: Arc<dyn CatalogBackend>) -> Self {
        Self { catalog }
    }

    async fn all(&self) -> Result<Vec<Region>, CloudError> {
        let catalog = self.catalog.service_catalog().await?;
        Ok(regions_of(&catalog))
    }

    /// Returns the first region with `id`, or `None`.
    ///
    /// # Errors
    ///
    /// Returns [`CloudError::Catalog`] when the catalog cannot be read.
    pub async fn get(&self, id: &str) -> Result<Option<Region>, CloudError> {
        Ok(self.all().await?.into_iter().find(|region| region.id() == id))
    }

    /// Lists regions one page at a time; duplicates are kept.
    ///
    /// # Errors
    ///
    /// Returns [`CloudError::Validation`] for a zero limit, or
    /// [`CloudError::Catalog`] when the catalog cannot be read.
    pub async fn list(
        &self,
        limit: Option<usize>,
        marker: Option<&str>,
    ) -> Result<PagedResults<Region>, CloudError> {
        let page_size = check_limit(limit)?;
        Ok(PagedResults::client_paged(self.all().await?, page_size, marker))
    }
}

impl std::fmt::Debug for RegionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegionService").finish_non_exhaustive()
    }
}

/// Walks services and endpoints in catalog order. `region` wins over
/// `region_id`; endpoints carrying neither are skipped.
fn regions_of(catalog: &[CatalogService]) -> Vec<Region> {
    catalog
        .iter()
        .flat_map(|service| &service.endpoints)
        .filter_map(|endpoint| {
            [&endpoint.region, &endpoint.region_id]
                .into_iter()
                .flatten()
                .find(|value| !value.is_empty())
        })
        .map(|region| Region::new(region.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::CatalogEndpoint;
    use rstest::rstest;

    fn endpoint(region: Option<&str>, region_id: Option<&str>) -> CatalogEndpoint {
        CatalogEndpoint {
            region: region.map(str::to_owned),
            region_id: region_id.map(str::to_owned),
            ..CatalogEndpoint::default()
        }
    }

    fn service(endpoints: Vec<CatalogEndpoint>) -> CatalogService {
        CatalogService {
            endpoints,
            ..CatalogService::default()
        }
    }

    fn ids(regions: &[Region]) -> Vec<&str> {
        regions.iter().map(Identified::id).collect()
    }

    #[rstest]
    fn duplicates_across_services_are_kept() {
        let catalog = vec![
            service(vec![endpoint(Some("RegionOne"), None)]),
            service(vec![endpoint(Some("RegionOne"), None)]),
        ];
        assert_eq!(ids(&regions_of(&catalog)), ["RegionOne", "RegionOne"]);
    }

    #[rstest]
    #[case(endpoint(Some("east"), Some("west")), Some("east"))]
    #[case(endpoint(Some(""), Some("west")), Some("west"))]
    #[case(endpoint(None, Some("west")), Some("west"))]
    #[case(endpoint(None, None), None)]
    #[case(endpoint(Some(""), Some("")), None)]
    fn region_field_precedence(#[case] endpoint: CatalogEndpoint, #[case] expected: Option<&str>) {
        let regions = regions_of(&[service(vec![endpoint])]);
        assert_eq!(ids(&regions).first().copied(), expected);
    }
}
