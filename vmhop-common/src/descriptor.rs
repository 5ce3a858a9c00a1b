use serde::{Deserialize, Serialize};

use crate::error::DescriptorError;

/// VM description as printed by `az vm show --output json`.
///
/// Only the fields a launch needs are modeled; everything else is ignored.
/// They are optional here so a missing one can be reported by path.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceDescriptor {
    pub name: Option<String>,
    pub hardware_profile: Option<HardwareProfile>,
    pub storage_profile: Option<StorageProfile>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HardwareProfile {
    pub vm_size: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageProfile {
    pub image_reference: Option<ImageReference>,
}

/// Image reference; only `id` is carried over
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImageReference {
    pub id: Option<String>,
}

/// The three settings carried over to the destination
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InstanceSpec {
    pub shape: String,
    pub display_name: String,
    pub image_id: String,
}

impl TryFrom<SourceDescriptor> for InstanceSpec {
    type Error = DescriptorError;

    fn try_from(source: SourceDescriptor) -> Result<Self, Self::Error> {
        let shape = required(
            "hardwareProfile.vmSize",
            source.hardware_profile.and_then(|h| h.vm_size),
        )?;
        let display_name = required("name", source.name)?;
        let image_id = required(
            "storageProfile.imageReference.id",
            source
                .storage_profile
                .and_then(|s| s.image_reference)
                .and_then(|i| i.id),
        )?;

        Ok(Self {
            shape,
            display_name,
            image_id,
        })
    }
}

fn required(path: &'static str, value: Option<String>) -> Result<String, DescriptorError> {
    let value = value.ok_or(DescriptorError::MissingField(path))?;
    if value.trim().is_empty() {
        return Err(DescriptorError::EmptyField(path));
    }
    Ok(value)
}

/// Instance returned by `oci compute instance launch`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct LaunchedInstance {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub lifecycle_state: Option<String>,
}

/// The OCI CLI wraps resources in `{"data": ...}`; the bare form is accepted too
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum LaunchResponse {
    Wrapped { data: LaunchedInstance },
    Bare(LaunchedInstance),
}

impl From<LaunchResponse> for LaunchedInstance {
    fn from(response: LaunchResponse) -> Self {
        match response {
            LaunchResponse::Wrapped { data } => data,
            LaunchResponse::Bare(instance) => instance,
        }
    }
}
