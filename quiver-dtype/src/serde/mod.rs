pub mod flatbuffers;
