use std::sync::{Arc, Mutex};

use reel_pipeline::{Script, ScriptPlanner, Segment};

/// Builds a script with one segment per prompt, indexed in order.
pub fn script_with_prompts(title: &str, prompts: &[&str]) -> Script {
    Script {
        title: title.to_string(),
        narration: "A narration shared by every segment.".to_string(),
        visual_style: "test style".to_string(),
        video_logline: None,
        segments: prompts
            .iter()
            .enumerate()
            .map(|(index, prompt)| Segment {
                index,
                image_prompt: prompt.to_string(),
            })
            .collect(),
    }
}

#[derive(Clone)]
pub struct MockPlanner {
    pub script: Script,
    pub calls: Arc<Mutex<Vec<String>>>,
    pub fail_with: Option<String>,
}

impl MockPlanner {
    pub fn new(script: Script) -> Self {
        Self {
            script,
            calls: Arc::new(Mutex::new(Vec::new())),
            fail_with: None,
        }
    }

    pub fn failing(msg: &str) -> Self {
        Self {
            script: script_with_prompts("unused", &["unused"]),
            calls: Arc::new(Mutex::new(Vec::new())),
            fail_with: Some(msg.to_string()),
        }
    }
}

impl ScriptPlanner for MockPlanner {
    const PLANNER_MODEL: &str = "mock-gpt";
    type Error = anyhow::Error;

    async fn plan(&self, topic: &str) -> Result<Script, Self::Error> {
        self.calls.lock().unwrap().push(topic.to_string());
        if let Some(ref msg) = self.fail_with {
            return Err(anyhow::anyhow!("{}", msg));
        }
        Ok(self.script.clone())
    }
}
