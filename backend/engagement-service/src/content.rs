/// Engagement content pools
///
/// Three fixed categories of message text, compiled into the binary. Selection
/// is a two-stage draw: first a pool uniformly among the three, then an item
/// uniformly within the chosen pool. The two stages are part of the contract;
/// flattening to a single uniform draw over all items would change the
/// per-item probabilities whenever pool sizes diverge.
use rand::Rng;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ContentItem {
    pub title: &'static str,
    pub body: &'static str,
}

pub const HUMOR: [ContentItem; 5] = [
    ContentItem {
        title: "😄 Dino Joke Time!",
        body: "Why did the dino go to the doctor? Because he had a \"rawr\" throat! 🦖",
    },
    ContentItem {
        title: "🤣 Connect Humor",
        body: "What do you call a task that's always late? A \"deadline\"! 😅",
    },
    ContentItem {
        title: "😆 Fun Fact",
        body: "Did you know? Helping others releases endorphins - nature's way of saying \"you're awesome!\" 🌟",
    },
    ContentItem {
        title: "🎉 Motivation Boost",
        body: "Remember: Every task completed is a step toward making someone's day better! 💪",
    },
    ContentItem {
        title: "🦖 Dino Wisdom",
        body: "Even dinosaurs had to start somewhere. Your journey to helping others starts with one task! 🚀",
    },
];

pub const TIPS: [ContentItem; 5] = [
    ContentItem {
        title: "💡 Pro Tip",
        body: "Complete your profile to get more task requests! People trust users with complete profiles.",
    },
    ContentItem {
        title: "🎯 Task Success",
        body: "Clear communication is key! Always ask questions if you're unsure about a task.",
    },
    ContentItem {
        title: "⭐ Rating Boost",
        body: "Deliver quality work and ask for ratings - they help you get more opportunities!",
    },
    ContentItem {
        title: "🔍 Smart Searching",
        body: "Use filters to find tasks that match your skills and location!",
    },
    ContentItem {
        title: "💰 Earn More",
        body: "Set competitive prices and provide excellent service to build a loyal client base!",
    },
];

pub const MOTIVATION: [ContentItem; 5] = [
    ContentItem {
        title: "🌟 You're Amazing!",
        body: "Every task you complete makes the world a better place. Keep up the great work!",
    },
    ContentItem {
        title: "💪 Power Move",
        body: "Your skills are valuable. Don't underestimate the impact you can make!",
    },
    ContentItem {
        title: "🎯 Goal Achiever",
        body: "Small steps lead to big changes. Every task is progress toward your goals!",
    },
    ContentItem {
        title: "🔥 On Fire!",
        body: "You're building something amazing - a network of people who trust and value your work!",
    },
    ContentItem {
        title: "🚀 Rising Star",
        body: "Your dedication to helping others is inspiring. The community needs people like you!",
    },
];

const POOLS: [&[ContentItem]; 3] = [&HUMOR, &TIPS, &MOTIVATION];

/// Pick one content item: pool first, then item within the pool.
pub fn pick_random(rng: &mut impl Rng) -> ContentItem {
    let pool = POOLS[rng.gen_range(0..POOLS.len())];
    pool[rng.gen_range(0..pool.len())]
}
