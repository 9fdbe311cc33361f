pub mod definition_mapper;
pub mod instance_mapper;
pub mod payment_source_mapper;
