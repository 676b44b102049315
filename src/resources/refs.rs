//! Typed-or-identifier parameters.
//!
//! Service operations accept either a wrapped resource or a bare string for
//! every parameter that names a resource. The enums below carry that choice
//! and resolve it to the identifier the backend expects.

use super::{
    Identified, Instance, InstanceType, KeyPair, MachineImage, PlacementZone, SecurityGroup,
    Snapshot, Volume,
};

macro_rules! resource_ref {
    (
        $(#[$meta:meta])*
        $name:ident, $entity:ident, $bare:ident, |$resource:ident| $identity:expr
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug)]
        pub enum $name<'a> {
            /// A wrapped resource; its identity accessor is used.
            $entity(&'a $entity),
            /// A bare value supplied by the caller.
            $bare(&'a str),
        }

        impl<'a> $name<'a> {
            /// Returns the identifier passed to the backend.
            #[must_use]
            pub fn as_identifier(&self) -> &'a str {
                match *self {
                    Self::$entity($resource) => $identity,
                    Self::$bare(value) => value,
                }
            }
        }

        impl<'a> From<&'a $entity> for $name<'a> {
            fn from(value: &'a $entity) -> Self {
                Self::$entity(value)
            }
        }

        impl<'a> From<&'a str> for $name<'a> {
            fn from(value: &'a str) -> Self {
                Self::$bare(value)
            }
        }

        impl<'a> From<&'a String> for $name<'a> {
            fn from(value: &'a String) -> Self {
                Self::$bare(value.as_str())
            }
        }
    };
}

resource_ref!(
    /// Machine image given as a wrapper or an image id.
    ImageRef, MachineImage, Id, |image| image.id()
);
resource_ref!(
    /// Instance type given as a wrapper or a name.
    ///
    /// A bare value is looked up by name in the instance-type catalog before
    /// use, since names and identifiers differ on most providers.
    InstanceTypeRef, InstanceType, Name, |instance_type| instance_type.id()
);
resource_ref!(
    /// Placement zone given as a value or a zone name.
    ZoneRef, PlacementZone, Id, |zone| zone.id()
);
resource_ref!(
    /// Key pair given as a wrapper or a key pair name.
    KeyPairRef, KeyPair, Name, |key_pair| key_pair.name()
);
resource_ref!(
    /// Snapshot given as a wrapper or a snapshot id.
    SnapshotRef, Snapshot, Id, |snapshot| snapshot.id()
);
resource_ref!(
    /// Volume given as a wrapper or a volume id.
    VolumeRef, Volume, Id, |volume| volume.id()
);
resource_ref!(
    /// Security group given as a wrapper or a group name.
    ///
    /// Instance launch addresses groups by name, so a wrapper contributes its
    /// name rather than its id.
    SecurityGroupRef, SecurityGroup, Name, |group| group.name()
);
resource_ref!(
    /// Instance given as a wrapper or an instance id.
    InstanceRef, Instance, Id, |instance| instance.id()
);

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn bare_values_pass_through() {
        let owned = String::from("img-2");
        assert_eq!(ImageRef::from("img-1").as_identifier(), "img-1");
        assert_eq!(ImageRef::from(&owned).as_identifier(), "img-2");
        assert_eq!(KeyPairRef::from("deploy").as_identifier(), "deploy");
    }

    #[rstest]
    fn zone_value_contributes_its_id() {
        let zone = PlacementZone::new("nova", Some("RegionOne"));
        assert_eq!(ZoneRef::from(&zone).as_identifier(), "nova");
    }
}
