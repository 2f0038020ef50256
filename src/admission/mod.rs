mod admission_service;
#[cfg(test)]
mod tests;

pub use admission_service::AdmissionService;
