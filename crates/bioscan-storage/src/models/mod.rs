pub mod biometric_record;

pub use biometric_record::BiometricRecord;
