use super::command::{Command, Reply, ScoreBound, format_score};
use super::traits::KvStore;
use crate::error::TransportError;
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Instant;

const WRONG_TYPE: &str = "WRONGTYPE Operation against a key holding the wrong kind of value";

#[derive(Debug, Clone)]
enum Entry {
    Str {
        value: String,
        expires_at: Option<Instant>,
    },
    List(VecDeque<String>),
    /// Kept sorted by (score, member), matching backend rank order.
    ZSet(Vec<(f64, String)>),
    Hash(BTreeMap<String, String>),
}

/// In-process backend with the same command semantics as the remote store.
///
/// A whole pipeline is applied under one lock. Used as the test double and
/// for offline runs.
pub struct MemoryStore {
    name: String,
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::named("memory")
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Number of live keys.
    pub fn len(&self) -> usize {
        let mut entries = self.lock();
        purge_expired(&mut entries);
        entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, Entry>> {
        self.entries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn wrong_type(&self) -> TransportError {
        self.rejected(WRONG_TYPE)
    }

    fn rejected(&self, message: &str) -> TransportError {
        TransportError::Command {
            store: self.name.clone(),
            message: message.to_string(),
        }
    }

    #[allow(clippy::too_many_lines)]
    fn apply(
        &self,
        entries: &mut HashMap<String, Entry>,
        command: Command,
    ) -> Result<Reply, TransportError> {
        let now = Instant::now();
        let expired = matches!(
            entries.get(command.key()),
            Some(Entry::Str { expires_at: Some(deadline), .. }) if *deadline <= now
        );
        if expired {
            entries.remove(command.key());
        }

        match command {
            Command::Get { key } => match entries.get(&key) {
                None => Ok(Reply::Nil),
                Some(Entry::Str { value, .. }) => Ok(Reply::Str(value.clone())),
                Some(_) => Err(self.wrong_type()),
            },
            Command::Set { key, value, ttl } => {
                let expires_at = ttl.map(|ttl| now + ttl);
                entries.insert(key, Entry::Str { value, expires_at });
                Ok(Reply::ok())
            }
            Command::Del { key } => Ok(Reply::Int(i64::from(entries.remove(&key).is_some()))),
            Command::Incr { key } => {
                let entry = entries.entry(key).or_insert_with(|| Entry::Str {
                    value: "0".into(),
                    expires_at: None,
                });
                let Entry::Str { value, .. } = entry else {
                    return Err(self.wrong_type());
                };
                let current: i64 = value
                    .parse()
                    .map_err(|_| self.rejected("ERR value is not an integer or out of range"))?;
                let next = current + 1;
                *value = next.to_string();
                Ok(Reply::Int(next))
            }
            Command::LPush { key, value } => {
                let entry = entries
                    .entry(key)
                    .or_insert_with(|| Entry::List(VecDeque::new()));
                let Entry::List(list) = entry else {
                    return Err(self.wrong_type());
                };
                list.push_front(value);
                Ok(Reply::Int(to_i64(list.len())))
            }
            Command::RPop { key } => {
                let popped = match entries.get_mut(&key) {
                    None => return Ok(Reply::Nil),
                    Some(Entry::List(list)) => list.pop_back(),
                    Some(_) => return Err(self.wrong_type()),
                };
                if matches!(entries.get(&key), Some(Entry::List(list)) if list.is_empty()) {
                    entries.remove(&key);
                }
                Ok(popped.map_or(Reply::Nil, Reply::Str))
            }
            Command::LRange { key, start, stop } => match entries.get(&key) {
                None => Ok(Reply::Array(Vec::new())),
                Some(Entry::List(list)) => {
                    let items = normalize_range(start, stop, list.len())
                        .map(|(from, to)| {
                            list.range(from..=to)
                                .map(|item| Reply::Str(item.clone()))
                                .collect()
                        })
                        .unwrap_or_default();
                    Ok(Reply::Array(items))
                }
                Some(_) => Err(self.wrong_type()),
            },
            Command::LTrim { key, start, stop } => {
                let keep = match entries.get_mut(&key) {
                    None => return Ok(Reply::ok()),
                    Some(Entry::List(list)) => match normalize_range(start, stop, list.len()) {
                        Some((from, to)) => {
                            list.truncate(to + 1);
                            list.drain(..from);
                            true
                        }
                        None => false,
                    },
                    Some(_) => return Err(self.wrong_type()),
                };
                if !keep {
                    entries.remove(&key);
                }
                Ok(Reply::ok())
            }
            Command::ZAdd {
                key,
                score,
                member,
                only_greater,
            } => {
                let entry = entries.entry(key).or_insert_with(|| Entry::ZSet(Vec::new()));
                let Entry::ZSet(set) = entry else {
                    return Err(self.wrong_type());
                };
                let added = if let Some(pos) = set.iter().position(|(_, m)| *m == member) {
                    if !only_greater || score > set[pos].0 {
                        set.remove(pos);
                        insert_sorted(set, score, member);
                    }
                    0
                } else {
                    insert_sorted(set, score, member);
                    1
                };
                Ok(Reply::Int(added))
            }
            Command::ZRangeByScore { key, min, max } => match entries.get(&key) {
                None => Ok(Reply::Array(Vec::new())),
                Some(Entry::ZSet(set)) => Ok(Reply::Array(
                    set.iter()
                        .filter(|(score, _)| in_bounds(*score, min, max))
                        .map(|(_, member)| Reply::Str(member.clone()))
                        .collect(),
                )),
                Some(_) => Err(self.wrong_type()),
            },
            Command::ZRevRange { key, start, stop } => match entries.get(&key) {
                None => Ok(Reply::Array(Vec::new())),
                Some(Entry::ZSet(set)) => {
                    let items = normalize_range(start, stop, set.len())
                        .map(|(from, to)| {
                            set.iter()
                                .rev()
                                .skip(from)
                                .take(to - from + 1)
                                .map(|(_, member)| Reply::Str(member.clone()))
                                .collect()
                        })
                        .unwrap_or_default();
                    Ok(Reply::Array(items))
                }
                Some(_) => Err(self.wrong_type()),
            },
            Command::ZRemRangeByRank { key, start, stop } => {
                let removed = match entries.get_mut(&key) {
                    None => return Ok(Reply::Int(0)),
                    Some(Entry::ZSet(set)) => match normalize_range(start, stop, set.len()) {
                        Some((from, to)) => set.drain(from..=to).count(),
                        None => 0,
                    },
                    Some(_) => return Err(self.wrong_type()),
                };
                if matches!(entries.get(&key), Some(Entry::ZSet(set)) if set.is_empty()) {
                    entries.remove(&key);
                }
                Ok(Reply::Int(to_i64(removed)))
            }
            Command::ZScore { key, member } => match entries.get(&key) {
                None => Ok(Reply::Nil),
                Some(Entry::ZSet(set)) => Ok(set
                    .iter()
                    .find(|(_, m)| *m == member)
                    .map_or(Reply::Nil, |(score, _)| Reply::Str(format_score(*score)))),
                Some(_) => Err(self.wrong_type()),
            },
            Command::ZCard { key } => match entries.get(&key) {
                None => Ok(Reply::Int(0)),
                Some(Entry::ZSet(set)) => Ok(Reply::Int(to_i64(set.len()))),
                Some(_) => Err(self.wrong_type()),
            },
            Command::HSet { key, field, value } => {
                let entry = entries
                    .entry(key)
                    .or_insert_with(|| Entry::Hash(BTreeMap::new()));
                let Entry::Hash(hash) = entry else {
                    return Err(self.wrong_type());
                };
                Ok(Reply::Int(i64::from(hash.insert(field, value).is_none())))
            }
            Command::HGetAll { key } => match entries.get(&key) {
                None => Ok(Reply::Array(Vec::new())),
                Some(Entry::Hash(hash)) => Ok(Reply::Array(
                    hash.iter()
                        .flat_map(|(field, value)| {
                            [Reply::Str(field.clone()), Reply::Str(value.clone())]
                        })
                        .collect(),
                )),
                Some(_) => Err(self.wrong_type()),
            },
            Command::HKeys { key } => match entries.get(&key) {
                None => Ok(Reply::Array(Vec::new())),
                Some(Entry::Hash(hash)) => Ok(Reply::Array(
                    hash.keys().map(|field| Reply::Str(field.clone())).collect(),
                )),
                Some(_) => Err(self.wrong_type()),
            },
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn execute(&self, command: Command) -> Result<Reply, TransportError> {
        let mut entries = self.lock();
        self.apply(&mut entries, command)
    }

    async fn pipeline(&self, commands: Vec<Command>) -> Result<Vec<Reply>, TransportError> {
        let mut entries = self.lock();
        let mut replies = Vec::with_capacity(commands.len());
        let mut first_error = None;
        for command in commands {
            match self.apply(&mut entries, command) {
                Ok(reply) => replies.push(reply),
                Err(error) => {
                    replies.push(Reply::Nil);
                    first_error.get_or_insert(error);
                }
            }
        }
        match first_error {
            Some(error) => Err(error),
            None => Ok(replies),
        }
    }
}

fn purge_expired(entries: &mut HashMap<String, Entry>) {
    let now = Instant::now();
    entries.retain(|_, entry| match entry {
        Entry::Str {
            expires_at: Some(deadline),
            ..
        } => *deadline > now,
        _ => true,
    });
}

fn insert_sorted(set: &mut Vec<(f64, String)>, score: f64, member: String) {
    let pos = set.partition_point(|(s, m)| match s.total_cmp(&score) {
        std::cmp::Ordering::Less => true,
        std::cmp::Ordering::Equal => *m < member,
        std::cmp::Ordering::Greater => false,
    });
    set.insert(pos, (score, member));
}

fn in_bounds(score: f64, min: ScoreBound, max: ScoreBound) -> bool {
    min.admits_from_below(score) && max.admits_from_above(score)
}

/// Resolve backend-style inclusive indexes (negative counts from the end).
fn normalize_range(start: i64, stop: i64, len: usize) -> Option<(usize, usize)> {
    let len = to_i64(len);
    let start = if start < 0 { len + start } else { start }.max(0);
    let stop = if stop < 0 { len + stop } else { stop }.min(len - 1);
    if start > stop || start >= len {
        return None;
    }
    Some((usize::try_from(start).ok()?, usize::try_from(stop).ok()?))
}

fn to_i64(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}
