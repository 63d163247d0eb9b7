use crate::adapter::SceneAdapter;
use crate::config::OutlinerConfig;
use crate::error::OutlinerResult;
use crate::host::SceneHost;
use crate::outliner::Outliner;

/// Replace `current` with a freshly generated outliner
///
/// The previous outliner is invalidated and discarded first, so a failed
/// generation leaves no outliner behind.
pub fn generate<'a>(
    current: &'a mut Option<Outliner>,
    host: &dyn SceneHost,
    config: &OutlinerConfig,
) -> OutlinerResult<&'a mut Outliner> {
    if let Some(mut previous) = current.take() {
        previous.invalidate();
    }
    let outliner = SceneAdapter::new(host, config).build()?;
    tracing::info!(
        "Generated outliner for '{}' ({} nodes)",
        outliner.filename(),
        outliner.node_count()
    );
    Ok(current.insert(outliner))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, Ordering};

    use super::*;
    use crate::error::OutlinerError;
    use crate::host::MemoryScene;
    use crate::host::fixtures::workshop;

    #[test]
    fn test_generate_replaces_and_invalidates_previous() {
        let w = workshop();
        let config = OutlinerConfig::default();
        let mut current = None;
        generate(&mut current, &w.scene, &config).unwrap();

        let notified = Arc::new(AtomicBool::new(false));
        let flag = notified.clone();
        current
            .as_mut()
            .unwrap()
            .subscribe(move |_| flag.store(true, Ordering::SeqCst));

        let fresh = generate(&mut current, &w.scene, &config).unwrap();
        assert!(!fresh.is_obsolete());
        assert!(notified.load(Ordering::SeqCst));
    }

    #[test]
    fn test_failed_generate_discards_previous() {
        let w = workshop();
        let config = OutlinerConfig::default();
        let mut current = None;
        generate(&mut current, &w.scene, &config).unwrap();

        let result = generate(&mut current, &MemoryScene::empty(), &config);
        assert_eq!(result.err(), Some(OutlinerError::NoModel));
        assert!(current.is_none());
    }
}
