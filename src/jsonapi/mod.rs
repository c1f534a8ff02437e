//! JSON:API wire format: serializer config, serialization, deserialization, error documents.

pub mod config;
pub mod deserializer;
pub mod error;
pub mod serializer;

pub use config::{
    id_only, Mode, ModelSerializer, RelationConfig, RelationshipMapper, ResourceIdentifier, SerializerConfig,
    SerializerConfigGenerator, SerializerRegistry,
};
pub use deserializer::{deserialize, synthesize_foreign_keys};
pub use error::{ErrorDocument, ErrorObject};
pub use serializer::{remove_null_relations, serialize, Document};
