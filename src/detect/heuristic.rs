use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::time::Duration;

use crate::data::DataAttachment;

use super::{DetectFuture, Detector, Provenance, RawDetection};

pub const DEFAULT_DELAY: Duration = Duration::from_millis(1500);
const CONFIDENCE: f32 = 0.87;
const LARGE_PAYLOAD_BYTES: usize = 20_000;
const BYTES_PER_EXTRA_DRAW: usize = 10_000;
const MAX_EXTRA_DRAWS: usize = 3;
const MIN_TERMS: usize = 3;
const MAX_TERMS: usize = 6;

const FRUITS: &[&str] = &[
    "blueberry", "raspberry", "strawberry", "orange", "kiwi", "avocado", "apple", "banana",
    "mango", "papaya", "lemon", "lime",
];
const VEGETABLES: &[&str] = &[
    "spinach", "lettuce", "cucumber", "tomato", "onion", "garlic", "carrot", "bell pepper",
    "mushroom", "cauliflower", "broccoli",
];
const NUTS: &[&str] = &[
    "pine nut", "pecan", "almond", "walnut", "cashew", "pistachio", "hazelnut",
];
const HERBS: &[&str] = &[
    "mint", "parsley", "cilantro", "basil", "oregano", "thyme", "rosemary", "sage",
];
const GRAINS: &[&str] = &["rice", "bread", "cracker", "pasta", "noodle", "quinoa", "oats"];
const PROTEINS: &[&str] = &[
    "chicken", "beef", "pork", "lamb", "fish", "shrimp", "egg", "milk", "cheese", "tofu",
];
const LEGUMES: &[&str] = &["bean", "lentil", "chickpea", "pea", "corn"];

/// Category name and members, in draw order.
pub const TAXONOMY: [(&str, &[&str]); 7] = [
    ("fruits", FRUITS),
    ("vegetables", VEGETABLES),
    ("nuts", NUTS),
    ("herbs", HERBS),
    ("grains", GRAINS),
    ("proteins", PROTEINS),
    ("legumes", LEGUMES),
];

/// Picks 3 to 6 distinct taxonomy terms. Larger payloads add a nut and allow
/// up to three extra draws from random categories.
pub fn select_terms<R: Rng + ?Sized>(payload_size: usize, rng: &mut R) -> Vec<&'static str> {
    let mut selected = Vec::with_capacity(MAX_TERMS);
    selected.push(pick(rng, FRUITS));
    selected.push(pick(rng, VEGETABLES));
    if payload_size > LARGE_PAYLOAD_BYTES {
        selected.push(pick(rng, NUTS));
    }

    let extra_draws = (payload_size / BYTES_PER_EXTRA_DRAW).min(MAX_EXTRA_DRAWS);
    for _ in 0..extra_draws {
        let term = pick_any(rng);
        if !selected.contains(&term) {
            selected.push(term);
        }
    }

    while selected.len() < MIN_TERMS {
        let term = pick_any(rng);
        if !selected.contains(&term) {
            selected.push(term);
        }
    }

    selected.truncate(MAX_TERMS);
    selected
}

fn pick<R: Rng + ?Sized>(rng: &mut R, items: &[&'static str]) -> &'static str {
    items[rng.random_range(0..items.len())]
}

fn pick_any<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    let (_, items) = TAXONOMY[rng.random_range(0..TAXONOMY.len())];
    pick(rng, items)
}

/// Stand-in classifier: guesses ingredients from the payload size alone.
#[derive(Debug, Clone)]
pub struct HeuristicDetector {
    seed: Option<u64>,
    delay: Duration,
}

impl HeuristicDetector {
    pub fn new() -> Self {
        Self {
            seed: None,
            delay: DEFAULT_DELAY,
        }
    }

    /// A fixed seed makes every call with the same payload size repeat itself.
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        }
    }
}

impl Default for HeuristicDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl Detector for HeuristicDetector {
    fn name(&self) -> &'static str {
        "local heuristic"
    }

    fn detect<'a>(&'a self, image: &'a DataAttachment) -> DetectFuture<'a> {
        Box::pin(async move {
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            let mut rng = self.rng();
            let english = select_terms(image.len(), &mut rng)
                .into_iter()
                .map(str::to_string)
                .collect();
            Ok(RawDetection {
                english,
                japanese: Vec::new(),
                confidence: Some(CONFIDENCE),
                provenance: Provenance::LocalHeuristic,
            })
        })
    }
}
