use crate::core::Pipeline;
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;

/// Drives a pipeline through its read, process and write phases, in that order.
pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub async fn run(&self) -> Result<String> {
        tracing::info!("🚀 Starting staff directory lookup");
        self.monitor.log_stats("Start");

        // Extract
        let records = self.pipeline.extract().await?;
        tracing::info!("📥 Loaded {} prompts", records.len());
        self.monitor.log_stats("Read");

        // Transform
        let outputs = self.pipeline.transform(records).await?;
        tracing::info!("🔄 Processed {} prompts", outputs.len());
        self.monitor.log_stats("Process");

        // Load
        let output_path = self.pipeline.load(outputs).await?;
        tracing::info!("💾 Results written to {}", output_path);
        self.monitor.log_stats("Write");
        self.monitor.log_final_stats();

        Ok(output_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{InputRecord, OutputRecord};
    use crate::utils::error::EtlError;
    use std::sync::Mutex;

    #[derive(Default)]
    struct PhaseRecorder {
        phases: Mutex<Vec<&'static str>>,
        fail_transform: bool,
    }

    #[async_trait::async_trait]
    impl Pipeline for PhaseRecorder {
        async fn extract(&self) -> Result<Vec<InputRecord>> {
            self.phases.lock().unwrap().push("extract");
            Ok(vec![InputRecord {
                prompt: "At the school A in B".to_string(),
            }])
        }

        async fn transform(&self, data: Vec<InputRecord>) -> Result<Vec<OutputRecord>> {
            self.phases.lock().unwrap().push("transform");
            if self.fail_transform {
                return Err(EtlError::SearchError {
                    message: "down".to_string(),
                });
            }
            Ok(data
                .into_iter()
                .map(|r| OutputRecord {
                    prompt: r.prompt,
                    output: "none found".to_string(),
                })
                .collect())
        }

        async fn load(&self, result: Vec<OutputRecord>) -> Result<String> {
            self.phases.lock().unwrap().push("load");
            Ok(format!("{} rows", result.len()))
        }
    }

    #[tokio::test]
    async fn test_run_executes_phases_in_order() {
        let engine = EtlEngine::new(PhaseRecorder::default());

        let output = engine.run().await.unwrap();

        assert_eq!(output, "1 rows");
        assert_eq!(
            *engine.pipeline.phases.lock().unwrap(),
            vec!["extract", "transform", "load"]
        );
    }

    #[tokio::test]
    async fn test_run_stops_before_load_on_failure() {
        let engine = EtlEngine::new_with_monitoring(
            PhaseRecorder {
                fail_transform: true,
                ..Default::default()
            },
            true,
        );

        assert!(engine.run().await.is_err());
        assert_eq!(
            *engine.pipeline.phases.lock().unwrap(),
            vec!["extract", "transform"]
        );
    }
}
