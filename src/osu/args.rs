//! The `[@user | +mode [name] | name [+mode]]` argument of `profile`, `recent` and `top`.

use serenity::UserId;

use super::Mode;
use crate::data::Store;
use crate::error::UserError;
use crate::serenity;
use crate::KselonError;

/// Splits the argument into an optional name and a mode, mode 0 when none is given.
pub fn parse_args(args: Option<&str>) -> (Option<String>, Mode) {
    let Some(args) = args.map(str::trim).filter(|a| !a.is_empty()) else {
        return (None, Mode::VN_STD);
    };

    if let Some(rest) = args.strip_prefix('+') {
        let mut parts = rest.splitn(2, char::is_whitespace);
        let mode = Mode::parse(parts.next().unwrap_or_default());
        let name = parts.next().map(str::trim).filter(|n| !n.is_empty());
        return (name.map(str::to_string), mode);
    }

    // Anything after a second `+` is ignored.
    let mut parts = args.split('+');
    let name = parts.next().map(str::trim).filter(|n| !n.is_empty());
    match parts.next() {
        Some(mode) => (name.map(str::to_string), Mode::parse(mode.trim())),
        None => (Some(args.to_string()), Mode::VN_STD),
    }
}

/// Reads a user mention like `<@123>` or `<@!123>`.
pub fn parse_mention(word: &str) -> Option<UserId> {
    let id = word.strip_prefix("<@")?.strip_suffix('>')?;
    let id = id.strip_prefix('!').unwrap_or(id);
    id.parse::<u64>().ok().filter(|id| *id != 0).map(UserId::new)
}

/// The first user mentioned in the argument that isn't `bot`.
pub fn first_mention(args: Option<&str>, bot: UserId) -> Option<UserId> {
    args?
        .split_whitespace()
        .filter_map(parse_mention)
        .find(|user| *user != bot)
}

/// Finds whose scores to show.
///
/// A mention wins and uses the profile of that user. Otherwise an explicit name
/// is used, and without one the author's own profile, keeping its mode unless
/// another one was asked for.
pub async fn resolve(
    store: &dyn Store,
    author: UserId,
    mention: Option<UserId>,
    args: Option<&str>,
) -> Result<(String, Mode), KselonError> {
    if let Some(user) = mention {
        let profile = store
            .get_profile(user)
            .await?
            .ok_or(UserError::MentionNotFound { user })?;
        return Ok((profile.name, profile.mode));
    }

    let (name, mode) = parse_args(args);
    if let Some(name) = name {
        return Ok((name, mode));
    }

    let profile = store
        .get_profile(author)
        .await?
        .ok_or(UserError::NoProfile)?;
    let mode = if mode == Mode::VN_STD {
        profile.mode
    } else {
        mode
    };
    Ok((profile.name, mode))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::data::MemoryStore;
    use crate::data::Profile;

    fn parsed(name: Option<&str>, mode: Mode) -> (Option<String>, Mode) {
        (name.map(str::to_string), mode)
    }

    #[test]
    fn argument_forms() {
        assert_eq!(parse_args(None), parsed(None, Mode::VN_STD));
        assert_eq!(parse_args(Some("  ")), parsed(None, Mode::VN_STD));
        assert_eq!(parse_args(Some("+rx!std")), parsed(None, Mode::RX_STD));
        assert_eq!(
            parse_args(Some("+002!std some player")),
            parsed(Some("some player"), Mode::RX_STD)
        );
        assert_eq!(
            parse_args(Some("ano +rx!std")),
            parsed(Some("ano"), Mode::RX_STD)
        );
        assert_eq!(
            parse_args(Some("ano+RX!STD")),
            parsed(Some("ano"), Mode::RX_STD)
        );
        assert_eq!(parse_args(Some("ano")), parsed(Some("ano"), Mode::VN_STD));
        assert_eq!(
            parse_args(Some("name +rx!std +x")),
            parsed(Some("name"), Mode::RX_STD)
        );
        assert_eq!(
            parse_args(Some("ano +nonsense")),
            parsed(Some("ano"), Mode::VN_STD)
        );
    }

    #[test]
    fn mentions() {
        assert_eq!(parse_mention("<@42>"), Some(UserId::new(42)));
        assert_eq!(parse_mention("<@!42>"), Some(UserId::new(42)));
        assert_eq!(parse_mention("<#42>"), None);
        assert_eq!(parse_mention("ano"), None);

        let bot = UserId::new(1);
        assert_eq!(first_mention(Some("<@1> <@7>"), bot), Some(UserId::new(7)));
        assert_eq!(first_mention(Some("<@1>"), bot), None);
        assert_eq!(first_mention(None, bot), None);
    }

    async fn store_with(user: UserId, name: &str, mode: Mode) -> MemoryStore {
        let store = MemoryStore::default();
        let profile = Profile {
            name: name.to_string(),
            mode,
        };
        store.set_profile(user, &profile).await.unwrap();
        store
    }

    #[tokio::test]
    async fn mention_beats_everything() {
        let friend = UserId::new(2);
        let store = store_with(friend, "rieki", Mode::RX_STD).await;

        let resolved = resolve(&store, UserId::new(1), Some(friend), Some("ano +vn!taiko"))
            .await
            .unwrap();
        assert_eq!(resolved, ("rieki".to_string(), Mode::RX_STD));

        let missing = resolve(&store, UserId::new(1), Some(UserId::new(3)), None).await;
        assert!(matches!(
            missing,
            Err(KselonError::UserError(UserError::MentionNotFound { .. }))
        ));
    }

    #[tokio::test]
    async fn explicit_name_beats_stored_profile() {
        let author = UserId::new(1);
        let store = store_with(author, "ano", Mode::RX_STD).await;

        let resolved = resolve(&store, author, None, Some("someone")).await.unwrap();
        assert_eq!(resolved, ("someone".to_string(), Mode::VN_STD));
    }

    #[tokio::test]
    async fn stored_profile_keeps_its_mode_unless_overridden() {
        let author = UserId::new(1);
        let store = store_with(author, "ano", Mode::RX_STD).await;

        let resolved = resolve(&store, author, None, None).await.unwrap();
        assert_eq!(resolved, ("ano".to_string(), Mode::RX_STD));

        let resolved = resolve(&store, author, None, Some("+vn!taiko")).await.unwrap();
        assert_eq!(resolved, ("ano".to_string(), Mode::parse("vn!taiko")));
    }

    #[tokio::test]
    async fn no_profile_at_all() {
        let store = MemoryStore::default();

        let result = resolve(&store, UserId::new(1), None, None).await;
        assert!(matches!(
            result,
            Err(KselonError::UserError(UserError::NoProfile))
        ));
    }
}
