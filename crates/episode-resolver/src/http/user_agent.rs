use rand::RngExt;

/// Fixed pool of browser identities, sampled per request.
#[derive(Debug, Clone)]
pub struct UserAgentPool {
    agents: Vec<String>,
}

impl UserAgentPool {
    /// Falls back to a single browser identity when `agents` is empty.
    pub fn new(agents: Vec<String>) -> Self {
        let agents = if agents.is_empty() {
            vec![FALLBACK_UA.to_string()]
        } else {
            agents
        };
        Self { agents }
    }

    pub fn pick(&self) -> &str {
        let index = rand::rng().random_range(0..self.agents.len());
        &self.agents[index]
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

const FALLBACK_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
