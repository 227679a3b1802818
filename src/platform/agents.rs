//! User agent pool used for rotation

use rand::seq::SliceRandom;
use rand::Rng;

/// Placeholder replaced by a random integer each time an agent is used
pub const NUMERIC_PLACEHOLDER: &str = "{rand}";

/// Built-in desktop browser identities
const DEFAULT_USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; WOW64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/62.0.3202.9 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/61.0.3163.100 Safari/537.36 OPR/48.0.2685.52",
    "Mozilla/5.0 (Windows NT 10.0; WOW64; rv:56.0) Gecko/20100101 Firefox/56.0",
    "Mozilla/5.0 (Windows; U; Windows NT 6.1; en-US) AppleWebKit/533.20.25 (KHTML, like Gecko) Version/5.0.4 Safari/533.20.27",
    "Mozilla/5.0 (Windows NT 10.0; WOW64; Trident/7.0; rv:11.0) like Gecko",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/52.0.2743.116 Safari/537.36 Edge/15.15063",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/61.0.3163.100 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/61.0.3163.49 Safari/537.36 OPR/48.0.2685.7",
    "Mozilla/5.0 (X11; Linux i586; rv:31.0) Gecko/20100101 Firefox/31.0",
    "Mozilla/5.0 (X11; U; Linux x86_64; en-us) AppleWebKit/531.2+ (KHTML, like Gecko) Version/5.0 Safari/531.2",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_12_6) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/62.0.3202.75 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_12_6) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/60.0.3112.78 Safari/537.36 OPR/47.0.2631.55",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.12; rv:56.0) Gecko/20100101 Firefox/56.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_12_6) AppleWebKit/604.3.5 (KHTML, like Gecko) Version/11.0.1 Safari/604.3.5",
    "Mozilla/5.0 (X11; CrOS armv7l 9592.96.0) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/60.0.3112.114 Safari/537.36",
    "Mozilla/5.0 (X11; FreeBSD amd64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/40.0.2214.115 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/{rand}.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.1 Safari/605.1.{rand}",
    "Mozilla/5.0 (X11; Linux x86_64; rv:{rand}.0) Gecko/20100101 Firefox/121.0",
];

/// Documented soft cap on how many agents a run should use
pub const RECOMMENDED_MAX_AGENTS: usize = 16;

/// Default number of agents per run
pub const DEFAULT_AGENT_COUNT: usize = 8;

/// Whether the pool order is randomized at construction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShuffleMode {
    /// Shuffle once when the pool is built
    #[default]
    Shuffled,
    /// Keep the given order
    Fixed,
}

/// Ordered, read-only list of user agent templates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAgentPool {
    agents: Vec<String>,
}

impl UserAgentPool {
    /// Pool with the given agents in the given order
    pub fn new<I, S>(agents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            agents: agents.into_iter().map(Into::into).collect(),
        }
    }

    /// Built-in pool, shuffled with the thread RNG unless `mode` is `Fixed`
    pub fn builtin(mode: ShuffleMode) -> Self {
        Self::new(DEFAULT_USER_AGENTS.iter().copied()).arranged(mode, &mut rand::thread_rng())
    }

    /// Apply a shuffle mode with the given RNG
    pub fn arranged<R: Rng + ?Sized>(mut self, mode: ShuffleMode, rng: &mut R) -> Self {
        if mode == ShuffleMode::Shuffled {
            self.agents.shuffle(rng);
        }
        self
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// All templates in pool order
    pub fn agents(&self) -> &[String] {
        &self.agents
    }

    /// First `count` templates; the whole pool when `count` exceeds it
    pub fn take(&self, count: usize) -> &[String] {
        &self.agents[..count.min(self.agents.len())]
    }
}

impl Default for UserAgentPool {
    fn default() -> Self {
        Self::builtin(ShuffleMode::default())
    }
}

/// Substitute a fresh random integer into every placeholder of `template`
pub fn render_agent<R: Rng + ?Sized>(template: &str, rng: &mut R) -> String {
    if !template.contains(NUMERIC_PLACEHOLDER) {
        return template.to_string();
    }

    let mut parts = template.split(NUMERIC_PLACEHOLDER);
    let mut rendered = parts.next().unwrap_or_default().to_string();
    for part in parts {
        rendered.push_str(&rng.gen_range(1000..=9999u32).to_string());
        rendered.push_str(part);
    }
    rendered
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_builtin_fixed_keeps_order() {
        let pool = UserAgentPool::builtin(ShuffleMode::Fixed);
        assert_eq!(pool.len(), DEFAULT_USER_AGENTS.len());
        assert_eq!(pool.agents()[0], DEFAULT_USER_AGENTS[0]);
        assert!(pool.len() >= RECOMMENDED_MAX_AGENTS);
    }

    #[test]
    fn test_shuffle_is_permutation() {
        let mut rng = StdRng::seed_from_u64(7);
        let fixed = UserAgentPool::builtin(ShuffleMode::Fixed);
        let shuffled = fixed.clone().arranged(ShuffleMode::Shuffled, &mut rng);

        let mut a = fixed.agents().to_vec();
        let mut b = shuffled.agents().to_vec();
        a.sort();
        b.sort();
        assert_eq!(a, b);
    }

    #[test]
    fn test_take_clamps() {
        let pool = UserAgentPool::new(["a", "b", "c"]);
        assert_eq!(pool.take(2), ["a", "b"]);
        assert_eq!(pool.take(10).len(), 3);
        assert!(pool.take(0).is_empty());
    }

    #[test]
    fn test_render_agent() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(render_agent("plain", &mut rng), "plain");

        let rendered = render_agent("Chrome/{rand}.0 rv:{rand}", &mut rng);
        assert!(!rendered.contains(NUMERIC_PLACEHOLDER));
        let numbers: Vec<u32> = rendered
            .split(|c: char| !c.is_ascii_digit())
            .filter(|s| s.len() == 4)
            .map(|s| s.parse().unwrap())
            .collect();
        assert_eq!(numbers.len(), 2);
        assert!(numbers.iter().all(|n| (1000..=9999).contains(n)));
    }
}
