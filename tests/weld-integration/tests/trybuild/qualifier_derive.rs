use weld_macros::Qualifier;
use weld_spi::AsQualifier;

#[derive(Qualifier)]
struct Fast;

#[derive(Qualifier)]
#[qualifier(name = "Storage")]
struct StorageKind {
    backend: String,
    replicas: u32,
    #[qualifier(nonbinding)]
    description: String,
}

fn main() {
    let fast: weld_spi::Qualifier = Fast.into();
    assert_eq!(fast.type_name(), "Fast");

    let storage = StorageKind {
        backend: "disk".to_string(),
        replicas: 3,
        description: "local".to_string(),
    }
    .to_qualifier();
    assert_eq!(storage.type_name(), "Storage");
    assert!(!storage.is_binding("description"));
}
