pub struct Icons;

impl Icons {
    pub const ROCKET: &str = "🚀";
    pub const CHECK: &str = "✅";
    pub const CROSS: &str = "❌";
    pub const WARN: &str = "⚠️";
    pub const INFO: &str = "ℹ️";
    pub const BOOK: &str = "📚";
    pub const DATABASE: &str = "🗄️";
    pub const PERSON: &str = "👤";
    pub const KEY: &str = "🔑";
    pub const PENCIL: &str = "📝";
    pub const GLOBE: &str = "🌍";
}
