//! The fixed record schema, compiled into the binary.
//!
//! Records on the stream are `custom.demo` messages as published in
//! `proto/demo.proto`. The descriptor is assembled here rather than generated
//! by `protoc`, so building the workspace needs no external compiler.

use prost_reflect::{DescriptorPool, MessageDescriptor};
use prost_types::field_descriptor_proto::{Label, Type};
use prost_types::{
    DescriptorProto, EnumDescriptorProto, EnumValueDescriptorProto, FieldDescriptorProto,
    FileDescriptorProto, FileDescriptorSet,
};

pub const SCHEMA_FILE_NAME: &str = "custom/demo.proto";
pub const SCHEMA_PACKAGE: &str = "custom";
pub const DEMO_MESSAGE_NAME: &str = "custom.demo";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("invalid schema descriptor: {0}")]
    InvalidDescriptor(String),

    #[error("message type '{0}' not found in schema")]
    MessageNotFound(String),
}

pub fn demo_descriptor_pool() -> Result<DescriptorPool, SchemaError> {
    let file_set = FileDescriptorSet {
        file: vec![demo_file_descriptor()],
    };
    DescriptorPool::from_file_descriptor_set(file_set)
        .map_err(|error| SchemaError::InvalidDescriptor(error.to_string()))
}

pub fn demo_message_descriptor() -> Result<MessageDescriptor, SchemaError> {
    message_descriptor(&demo_descriptor_pool()?, DEMO_MESSAGE_NAME)
}

pub fn message_descriptor(
    pool: &DescriptorPool,
    message_name: &str,
) -> Result<MessageDescriptor, SchemaError> {
    pool.get_message_by_name(message_name)
        .ok_or_else(|| SchemaError::MessageNotFound(message_name.to_string()))
}

fn demo_file_descriptor() -> FileDescriptorProto {
    FileDescriptorProto {
        name: Some(SCHEMA_FILE_NAME.to_string()),
        package: Some(SCHEMA_PACKAGE.to_string()),
        syntax: Some("proto3".to_string()),
        enum_type: vec![priority_enum()],
        message_type: vec![address_message(), demo_message()],
        ..Default::default()
    }
}

fn priority_enum() -> EnumDescriptorProto {
    let values = [
        ("PRIORITY_UNSPECIFIED", 0),
        ("PRIORITY_LOW", 1),
        ("PRIORITY_HIGH", 2),
    ];
    EnumDescriptorProto {
        name: Some("Priority".to_string()),
        value: values
            .into_iter()
            .map(|(name, number)| EnumValueDescriptorProto {
                name: Some(name.to_string()),
                number: Some(number),
                ..Default::default()
            })
            .collect(),
        ..Default::default()
    }
}

fn address_message() -> DescriptorProto {
    DescriptorProto {
        name: Some("Address".to_string()),
        field: vec![
            field("street", 1, Type::String),
            field("city", 2, Type::String),
            field("postal_code", 3, Type::String),
        ],
        ..Default::default()
    }
}

fn demo_message() -> DescriptorProto {
    DescriptorProto {
        name: Some("demo".to_string()),
        field: vec![
            field("id", 1, Type::Int32),
            field("name", 2, Type::String),
            field("email", 3, Type::String),
            field("active", 4, Type::Bool),
            field("amount", 5, Type::Double),
            field("created_at", 6, Type::Int64),
            typed_field("priority", 7, Type::Enum, ".custom.Priority"),
            FieldDescriptorProto {
                label: Some(Label::Repeated as i32),
                ..field("tags", 8, Type::String)
            },
            typed_field("address", 9, Type::Message, ".custom.Address"),
        ],
        ..Default::default()
    }
}

fn field(name: &str, number: i32, kind: Type) -> FieldDescriptorProto {
    FieldDescriptorProto {
        name: Some(name.to_string()),
        number: Some(number),
        label: Some(Label::Optional as i32),
        r#type: Some(kind as i32),
        ..Default::default()
    }
}

fn typed_field(name: &str, number: i32, kind: Type, type_name: &str) -> FieldDescriptorProto {
    FieldDescriptorProto {
        type_name: Some(type_name.to_string()),
        ..field(name, number, kind)
    }
}

#[cfg(test)]
mod tests {
    use prost_reflect::{Cardinality, Kind};

    use super::*;

    #[test]
    fn demo_descriptor_exposes_all_declared_fields_in_number_order() {
        let descriptor = demo_message_descriptor().expect("schema should load");

        let names: Vec<String> = descriptor
            .fields()
            .map(|field| field.name().to_string())
            .collect();
        assert_eq!(
            names,
            vec![
                "id",
                "name",
                "email",
                "active",
                "amount",
                "created_at",
                "priority",
                "tags",
                "address",
            ]
        );
    }

    #[test]
    fn demo_descriptor_resolves_enum_and_nested_message_types() {
        let descriptor = demo_message_descriptor().expect("schema should load");

        let priority = descriptor
            .get_field_by_name("priority")
            .expect("priority field should exist");
        match priority.kind() {
            Kind::Enum(enum_descriptor) => {
                assert_eq!(enum_descriptor.full_name(), "custom.Priority");
                assert!(enum_descriptor.get_value_by_name("PRIORITY_HIGH").is_some());
            }
            other => panic!("priority should be an enum, got {other:?}"),
        }

        let address = descriptor
            .get_field_by_name("address")
            .expect("address field should exist");
        match address.kind() {
            Kind::Message(message) => assert_eq!(message.full_name(), "custom.Address"),
            other => panic!("address should be a message, got {other:?}"),
        }

        let tags = descriptor
            .get_field_by_name("tags")
            .expect("tags field should exist");
        assert_eq!(tags.cardinality(), Cardinality::Repeated);
    }

    #[test]
    fn unknown_message_name_is_reported() {
        let pool = demo_descriptor_pool().expect("schema should load");

        let error = message_descriptor(&pool, "custom.missing").expect_err("lookup should fail");
        assert_eq!(
            error,
            SchemaError::MessageNotFound("custom.missing".to_string())
        );
    }
}
