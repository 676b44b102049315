//! Compute (nova) client.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use crate::backend::{
    BackendFuture, ComputeBackend, ComputeError, ListQuery, RawFlavor, RawImage, RawKeyPair,
    RawSecurityGroup, RawSecurityGroupRule, RawServer, RuleCreate, ServerCreate,
};
use crate::launch::{BlockDeviceMapping, NetworkInterface};

use super::http::{HttpFailure, RestClient, paging_query};

/// Compute client speaking the nova v2.1 API.
#[derive(Clone, Debug)]
pub struct ComputeClient {
    rest: RestClient,
}

impl ComputeClient {
    pub(crate) const fn new(rest: RestClient) -> Self {
        Self { rest }
    }
}

fn failed(err: HttpFailure) -> ComputeError {
    err.provider()
}

fn missing<'a>(resource: &'a str, id: &'a str) -> impl FnOnce(HttpFailure) -> ComputeError + 'a {
    move |err| err.lookup(resource, id)
}

#[derive(Deserialize)]
struct Servers {
    servers: Vec<RawServer>,
}

#[derive(Deserialize, Serialize)]
struct Server<T = RawServer> {
    server: T,
}

#[derive(Deserialize)]
struct Flavors {
    flavors: Vec<RawFlavor>,
}

#[derive(Deserialize)]
struct Flavor {
    flavor: RawFlavor,
}

#[derive(Deserialize)]
struct Images {
    images: Vec<RawImage>,
}

#[derive(Deserialize)]
struct Image {
    image: RawImage,
}

/// Key pair listings wrap every entry in its own `keypair` object.
#[derive(Deserialize)]
struct KeyPairs {
    keypairs: Vec<KeyPair>,
}

#[derive(Deserialize, Serialize)]
struct KeyPair<T = RawKeyPair> {
    keypair: T,
}

#[derive(Serialize)]
struct NewKeyPair<'a> {
    name: &'a str,
}

#[derive(Deserialize)]
struct SecurityGroups {
    security_groups: Vec<RawSecurityGroup>,
}

#[derive(Deserialize, Serialize)]
struct SecurityGroup<T = RawSecurityGroup> {
    security_group: T,
}

#[derive(Serialize)]
struct NewSecurityGroup<'a> {
    name: &'a str,
    description: &'a str,
}

#[derive(Deserialize, Serialize)]
struct SecurityGroupRule<T = RawSecurityGroupRule> {
    security_group_rule: T,
}

#[derive(Serialize)]
struct NewRule<'a> {
    parent_group_id: &'a str,
    ip_protocol: &'a str,
    from_port: i32,
    to_port: i32,
    cidr: &'a str,
}

#[derive(Serialize)]
struct VolumeAttachment<'a> {
    #[serde(rename = "volumeAttachment")]
    attachment: NewAttachment<'a>,
}

#[derive(Serialize)]
struct NewAttachment<'a> {
    #[serde(rename = "volumeId")]
    volume_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    device: Option<&'a str>,
}

#[derive(Serialize)]
struct SecurityGroupName<'a> {
    name: &'a str,
}

#[derive(Serialize)]
struct NewServer<'a> {
    name: &'a str,
    #[serde(rename = "imageRef")]
    image_ref: &'a str,
    #[serde(rename = "flavorRef")]
    flavor_ref: &'a str,
    min_count: u8,
    max_count: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    availability_zone: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    key_name: Option<&'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    security_groups: Vec<SecurityGroupName<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    user_data: Option<String>,
    #[serde(skip_serializing_if = "<[_]>::is_empty")]
    block_device_mapping_v2: &'a [BlockDeviceMapping],
    #[serde(skip_serializing_if = "<[_]>::is_empty")]
    networks: &'a [NetworkInterface],
}

impl<'a> NewServer<'a> {
    /// Nova expects user data base64-encoded.
    fn from_request(request: &'a ServerCreate) -> Self {
        Self {
            name: &request.name,
            image_ref: &request.image_id,
            flavor_ref: &request.flavor_id,
            min_count: 1,
            max_count: 1,
            availability_zone: request.availability_zone.as_deref(),
            key_name: request.key_name.as_deref(),
            security_groups: request
                .security_groups
                .iter()
                .map(|name| SecurityGroupName { name })
                .collect(),
            user_data: request
                .user_data
                .as_deref()
                .map(|data| STANDARD.encode(data)),
            block_device_mapping_v2: &request.block_devices,
            networks: &request.networks,
        }
    }
}

impl ComputeBackend for ComputeClient {
    fn list_servers(&self, query: ListQuery) -> BackendFuture<'_, Vec<RawServer>, ComputeError> {
        Box::pin(async move {
            let params = paging_query(query.limit, query.marker.as_deref());
            let body: Servers = self
                .rest
                .get_json(&["servers", "detail"], &params)
                .await
                .map_err(failed)?;
            Ok(body.servers)
        })
    }

    fn get_server<'a>(&'a self, id: &'a str) -> BackendFuture<'a, RawServer, ComputeError> {
        Box::pin(async move {
            let body: Server = self
                .rest
                .get_json(&["servers", id], &[])
                .await
                .map_err(missing("server", id))?;
            Ok(body.server)
        })
    }

    fn create_server<'a>(
        &'a self,
        request: &'a ServerCreate,
    ) -> BackendFuture<'a, RawServer, ComputeError> {
        Box::pin(async move {
            let payload = Server {
                server: NewServer::from_request(request),
            };
            let created: Server = self
                .rest
                .post_json(&["servers"], &payload)
                .await
                .map_err(failed)?;
            // The create response only carries the id and links.
            self.get_server(&created.server.id).await
        })
    }

    fn delete_server<'a>(&'a self, id: &'a str) -> BackendFuture<'a, (), ComputeError> {
        Box::pin(async move {
            self.rest
                .delete(&["servers", id])
                .await
                .map_err(missing("server", id))
        })
    }

    fn attach_volume<'a>(
        &'a self,
        server_id: &'a str,
        volume_id: &'a str,
        device: Option<&'a str>,
    ) -> BackendFuture<'a, (), ComputeError> {
        Box::pin(async move {
            let payload = VolumeAttachment {
                attachment: NewAttachment { volume_id, device },
            };
            self.rest
                .post_unit(&["servers", server_id, "os-volume_attachments"], &payload)
                .await
                .map_err(missing("server", server_id))
        })
    }

    fn detach_volume<'a>(
        &'a self,
        server_id: &'a str,
        volume_id: &'a str,
    ) -> BackendFuture<'a, (), ComputeError> {
        Box::pin(async move {
            self.rest
                .delete(&["servers", server_id, "os-volume_attachments", volume_id])
                .await
                .map_err(missing("volume attachment", volume_id))
        })
    }

    fn list_flavors(&self, query: ListQuery) -> BackendFuture<'_, Vec<RawFlavor>, ComputeError> {
        Box::pin(async move {
            let params = paging_query(query.limit, query.marker.as_deref());
            let body: Flavors = self
                .rest
                .get_json(&["flavors", "detail"], &params)
                .await
                .map_err(failed)?;
            Ok(body.flavors)
        })
    }

    fn get_flavor<'a>(&'a self, id: &'a str) -> BackendFuture<'a, RawFlavor, ComputeError> {
        Box::pin(async move {
            let body: Flavor = self
                .rest
                .get_json(&["flavors", id], &[])
                .await
                .map_err(missing("flavor", id))?;
            Ok(body.flavor)
        })
    }

    fn list_images(&self, query: ListQuery) -> BackendFuture<'_, Vec<RawImage>, ComputeError> {
        Box::pin(async move {
            let params = paging_query(query.limit, query.marker.as_deref());
            let body: Images = self
                .rest
                .get_json(&["images", "detail"], &params)
                .await
                .map_err(failed)?;
            Ok(body.images)
        })
    }

    fn get_image<'a>(&'a self, id: &'a str) -> BackendFuture<'a, RawImage, ComputeError> {
        Box::pin(async move {
            let body: Image = self
                .rest
                .get_json(&["images", id], &[])
                .await
                .map_err(missing("image", id))?;
            Ok(body.image)
        })
    }

    fn delete_image<'a>(&'a self, id: &'a str) -> BackendFuture<'a, (), ComputeError> {
        Box::pin(async move {
            self.rest
                .delete(&["images", id])
                .await
                .map_err(missing("image", id))
        })
    }

    fn list_keypairs(&self) -> BackendFuture<'_, Vec<RawKeyPair>, ComputeError> {
        Box::pin(async move {
            let body: KeyPairs = self
                .rest
                .get_json(&["os-keypairs"], &[])
                .await
                .map_err(failed)?;
            Ok(body.keypairs.into_iter().map(|entry| entry.keypair).collect())
        })
    }

    fn get_keypair<'a>(&'a self, name: &'a str) -> BackendFuture<'a, RawKeyPair, ComputeError> {
        Box::pin(async move {
            let body: KeyPair = self
                .rest
                .get_json(&["os-keypairs", name], &[])
                .await
                .map_err(missing("key pair", name))?;
            Ok(body.keypair)
        })
    }

    fn create_keypair<'a>(
        &'a self,
        name: &'a str,
    ) -> BackendFuture<'a, RawKeyPair, ComputeError> {
        Box::pin(async move {
            let payload = KeyPair {
                keypair: NewKeyPair { name },
            };
            let body: KeyPair = self
                .rest
                .post_json(&["os-keypairs"], &payload)
                .await
                .map_err(failed)?;
            Ok(body.keypair)
        })
    }

    fn delete_keypair<'a>(&'a self, name: &'a str) -> BackendFuture<'a, (), ComputeError> {
        Box::pin(async move {
            self.rest
                .delete(&["os-keypairs", name])
                .await
                .map_err(missing("key pair", name))
        })
    }

    fn list_security_groups(&self) -> BackendFuture<'_, Vec<RawSecurityGroup>, ComputeError> {
        Box::pin(async move {
            let body: SecurityGroups = self
                .rest
                .get_json(&["os-security-groups"], &[])
                .await
                .map_err(failed)?;
            Ok(body.security_groups)
        })
    }

    fn create_security_group<'a>(
        &'a self,
        name: &'a str,
        description: &'a str,
    ) -> BackendFuture<'a, RawSecurityGroup, ComputeError> {
        Box::pin(async move {
            let payload = SecurityGroup {
                security_group: NewSecurityGroup { name, description },
            };
            let body: SecurityGroup = self
                .rest
                .post_json(&["os-security-groups"], &payload)
                .await
                .map_err(failed)?;
            Ok(body.security_group)
        })
    }

    fn delete_security_group<'a>(&'a self, id: &'a str) -> BackendFuture<'a, (), ComputeError> {
        Box::pin(async move {
            self.rest
                .delete(&["os-security-groups", id])
                .await
                .map_err(missing("security group", id))
        })
    }

    fn create_security_group_rule<'a>(
        &'a self,
        request: &'a RuleCreate,
    ) -> BackendFuture<'a, RawSecurityGroupRule, ComputeError> {
        Box::pin(async move {
            let payload = SecurityGroupRule {
                security_group_rule: NewRule {
                    parent_group_id: &request.group_id,
                    ip_protocol: &request.ip_protocol,
                    from_port: request.from_port,
                    to_port: request.to_port,
                    cidr: &request.cidr,
                },
            };
            let body: SecurityGroupRule = self
                .rest
                .post_json(&["os-security-group-rules"], &payload)
                .await
                .map_err(missing("security group", &request.group_id))?;
            Ok(body.security_group_rule)
        })
    }
}
