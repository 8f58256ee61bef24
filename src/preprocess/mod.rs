pub mod decode;
pub mod letterbox;
pub mod tensor;
