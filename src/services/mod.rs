pub mod assets;
pub mod cloudinary;
pub mod ingest;
pub mod s3;
pub mod scratch;
pub mod uploads;
