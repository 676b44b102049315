//! Object-storage (swift) client.

use crate::backend::{
    BackendFuture, ContainerQuery, ObjectStorageBackend, ObjectStorageError, RawContainer,
    RawObject,
};

use super::http::{HttpFailure, RestClient};

/// Object-storage client bound to one swift account URL.
#[derive(Clone, Debug)]
pub struct ObjectStorageClient {
    rest: RestClient,
}

impl ObjectStorageClient {
    pub(crate) const fn new(rest: RestClient) -> Self {
        Self { rest }
    }
}

fn failed(err: HttpFailure) -> ObjectStorageError {
    err.provider()
}

fn missing<'a>(
    resource: &'a str,
    id: &'a str,
) -> impl FnOnce(HttpFailure) -> ObjectStorageError + 'a {
    move |err| err.lookup(resource, id)
}

/// Swift listing parameters; JSON output is always requested.
fn listing_query(query: &ContainerQuery) -> Vec<(&'static str, String)> {
    let mut params = vec![("format", String::from("json"))];
    if let Some(prefix) = &query.prefix {
        params.push(("prefix", prefix.clone()));
    }
    if let Some(limit) = query.limit {
        params.push(("limit", limit.to_string()));
    }
    if let Some(marker) = &query.marker {
        params.push(("marker", marker.clone()));
    }
    params
}

impl ObjectStorageBackend for ObjectStorageClient {
    fn list_containers(
        &self,
        query: ContainerQuery,
    ) -> BackendFuture<'_, Vec<RawContainer>, ObjectStorageError> {
        Box::pin(async move {
            self.rest
                .get_json_list(&[], &listing_query(&query))
                .await
                .map_err(failed)
        })
    }

    fn create_container<'a>(
        &'a self,
        name: &'a str,
    ) -> BackendFuture<'a, (), ObjectStorageError> {
        Box::pin(async move {
            self.rest
                .put_bytes(&[name], Vec::new())
                .await
                .map_err(failed)
        })
    }

    fn delete_container<'a>(
        &'a self,
        name: &'a str,
    ) -> BackendFuture<'a, (), ObjectStorageError> {
        Box::pin(async move {
            self.rest
                .delete(&[name])
                .await
                .map_err(missing("container", name))
        })
    }

    fn list_objects<'a>(
        &'a self,
        container: &'a str,
        query: ContainerQuery,
    ) -> BackendFuture<'a, Vec<RawObject>, ObjectStorageError> {
        Box::pin(async move {
            self.rest
                .get_json_list(&[container], &listing_query(&query))
                .await
                .map_err(missing("container", container))
        })
    }

    fn put_object<'a>(
        &'a self,
        container: &'a str,
        name: &'a str,
        content: Vec<u8>,
    ) -> BackendFuture<'a, (), ObjectStorageError> {
        Box::pin(async move {
            self.rest
                .put_bytes(&[container, name], content)
                .await
                .map_err(missing("container", container))
        })
    }

    fn get_object<'a>(
        &'a self,
        container: &'a str,
        name: &'a str,
    ) -> BackendFuture<'a, Vec<u8>, ObjectStorageError> {
        Box::pin(async move {
            self.rest
                .get_bytes(&[container, name])
                .await
                .map_err(missing("object", name))
        })
    }

    fn delete_object<'a>(
        &'a self,
        container: &'a str,
        name: &'a str,
    ) -> BackendFuture<'a, (), ObjectStorageError> {
        Box::pin(async move {
            self.rest
                .delete(&[container, name])
                .await
                .map_err(missing("object", name))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn listing_query_always_asks_for_json() {
        let params = listing_query(&ContainerQuery::default());
        assert_eq!(params, [("format", String::from("json"))]);
    }

    #[rstest]
    fn listing_query_forwards_prefix_limit_and_marker() {
        let params = listing_query(&ContainerQuery {
            prefix: Some(String::from("logs/")),
            limit: Some(11),
            marker: Some(String::from("logs/a")),
        });
        let keys: Vec<_> = params.iter().map(|(key, _)| *key).collect();
        assert_eq!(keys, ["format", "prefix", "limit", "marker"]);
    }
}
