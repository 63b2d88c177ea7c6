// Folder discovery
//
// Walks storage roots and reports every directory that directly contains at
// least one video. Never follows directory symlinks and never descends past
// the configured depth, so cyclic or pathological mounts terminate.

use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

use crate::config::ExplorerConfig;
use crate::constants::{MAX_FOLDER_DEPTH, STORAGE_MOUNT_PREFIXES};
use super::{absolute_path, is_video_file};

#[derive(Debug, Clone)]
pub struct DiscoveryOptions {
    pub roots: Vec<PathBuf>,
    /// Deepest directory (in path separators) that will be listed
    pub max_depth: usize,
    pub include_mounted: bool,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self {
            roots: Vec::new(),
            max_depth: MAX_FOLDER_DEPTH,
            include_mounted: true,
        }
    }
}

impl DiscoveryOptions {
    pub fn from_config(config: &ExplorerConfig) -> Self {
        Self {
            roots: config.discovery_roots.clone(),
            max_depth: config.max_folder_depth,
            include_mounted: true,
        }
    }
}

/// Discover all folders holding videos, sorted by path.
pub fn discover_video_folders(options: &DiscoveryOptions) -> Vec<PathBuf> {
    let mut roots: Vec<PathBuf> = options
        .roots
        .iter()
        .filter_map(|r| match absolute_path(r) {
            Ok(abs) => Some(abs),
            Err(e) => {
                log::debug!("Cannot resolve discovery root {}: {}", r.display(), e);
                None
            }
        })
        .collect();
    if options.include_mounted {
        roots.extend(mounted_storage_roots());
    }

    let mut seen_roots = HashSet::new();
    let mut found = HashSet::new();
    for root in roots {
        if !seen_roots.insert(root.clone()) {
            continue;
        }
        walk_root(&root, options.max_depth, &mut found);
    }

    let mut folders: Vec<PathBuf> = found.into_iter().collect();
    folders.sort_by(|a, b| a.as_os_str().cmp(b.as_os_str()));
    folders
}

fn walk_root(root: &Path, max_depth: usize, found: &mut HashSet<PathBuf>) {
    if !root.is_dir() {
        log::debug!("Discovery root {} not present, skipping", root.display());
        return;
    }
    if path_depth(root) > max_depth {
        log::debug!("Discovery root {} is deeper than {}, skipping", root.display(), max_depth);
        return;
    }

    let walker = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| !e.file_type().is_dir() || path_depth(e.path()) <= max_depth);

    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                // Permission denied and friends: skip that subtree only
                log::debug!("Skipping unreadable path during discovery: {}", e);
                continue;
            }
        };

        let ft = entry.file_type();
        let is_file = ft.is_file() || (ft.is_symlink() && entry.path().is_file());
        if !is_file || !is_video_file(entry.path()) {
            continue;
        }

        if let Some(parent) = entry.path().parent() {
            found.insert(parent.to_path_buf());
        }
    }
}

/// Number of path separators below the filesystem root.
pub fn path_depth(path: &Path) -> usize {
    path.components()
        .filter(|c| matches!(c, Component::Normal(_)))
        .count()
}

/// Additional mounted storage (SD cards, USB drives) that may hold videos.
pub fn mounted_storage_roots() -> Vec<PathBuf> {
    #[cfg(target_os = "linux")]
    {
        match std::fs::read_to_string("/proc/self/mountinfo") {
            Ok(mountinfo) => storage_mount_points(&mountinfo),
            Err(e) => {
                log::debug!("Cannot read mount table: {}", e);
                Vec::new()
            }
        }
    }

    #[cfg(not(target_os = "linux"))]
    {
        Vec::new()
    }
}

/// Mount points from a mountinfo table that live under a storage prefix.
fn storage_mount_points(mountinfo: &str) -> Vec<PathBuf> {
    let mut points: Vec<PathBuf> = mountinfo
        .lines()
        .filter_map(parse_mount_point)
        .filter(|mp| {
            STORAGE_MOUNT_PREFIXES
                .iter()
                .any(|prefix| mp.starts_with(prefix) && mp.as_path() != Path::new(prefix))
        })
        .collect();
    points.sort();
    points.dedup();
    points
}

fn parse_mount_point(line: &str) -> Option<PathBuf> {
    let (left, _) = line.split_once(" - ")?;
    let fields: Vec<&str> = left.split_whitespace().collect();
    if fields.len() < 5 {
        return None;
    }
    Some(PathBuf::from(unescape_mountinfo(fields[4])))
}

fn unescape_mountinfo(s: &str) -> String {
    s.replace(r"\040", " ")
        .replace(r"\011", "\t")
        .replace(r"\012", "\n")
        .replace(r"\134", r"\")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, b"video").unwrap();
    }

    fn options(root: &Path, max_depth: usize) -> DiscoveryOptions {
        DiscoveryOptions {
            roots: vec![root.to_path_buf()],
            max_depth,
            include_mounted: false,
        }
    }

    #[test]
    fn test_path_depth() {
        assert_eq!(path_depth(Path::new("/")), 0);
        assert_eq!(path_depth(Path::new("/storage")), 1);
        assert_eq!(path_depth(Path::new("/storage/emulated/0/DCIM")), 4);
    }

    #[test]
    fn test_finds_folders_with_videos_sorted() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        touch(&root.join("root.mp4"));
        touch(&root.join("b").join("clip.MKV"));
        touch(&root.join("a").join("x").join("deep.avi"));
        touch(&root.join("a").join("photo.jpg"));
        std::fs::create_dir_all(root.join("empty")).unwrap();

        let folders = discover_video_folders(&options(root, usize::MAX));
        assert_eq!(
            folders,
            vec![
                root.to_path_buf(),
                root.join("a").join("x"),
                root.join("b"),
            ]
        );
    }

    #[test]
    fn test_depth_bound_is_respected() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        let base = path_depth(root);
        touch(&root.join("l1").join("one.mp4"));
        touch(&root.join("l1").join("l2").join("two.mp4"));
        touch(&root.join("l1").join("l2").join("l3").join("three.mp4"));

        // Directories up to base+2 are listed; l3 sits at base+3
        let folders = discover_video_folders(&options(root, base + 2));
        assert_eq!(folders, vec![root.join("l1"), root.join("l1").join("l2")]);

        let folders = discover_video_folders(&options(root, base));
        assert!(folders.is_empty());
    }

    #[test]
    fn test_missing_roots_are_ignored() {
        let tmp = TempDir::new().unwrap();
        touch(&tmp.path().join("v").join("a.mp4"));
        let opts = DiscoveryOptions {
            roots: vec![tmp.path().join("nope"), tmp.path().join("v"), tmp.path().join("v")],
            max_depth: usize::MAX,
            include_mounted: false,
        };
        assert_eq!(discover_video_folders(&opts), vec![tmp.path().join("v")]);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_cycle_terminates() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        touch(&root.join("loop").join("a.mp4"));
        std::os::unix::fs::symlink(root, root.join("loop").join("back")).unwrap();

        let folders = discover_video_folders(&options(root, usize::MAX));
        assert_eq!(folders, vec![root.join("loop")]);
    }

    #[cfg(unix)]
    #[test]
    fn test_permission_denied_subtree_is_skipped() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        touch(&root.join("open").join("a.mp4"));
        touch(&root.join("locked").join("b.mp4"));
        let locked = root.join("locked");
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o000)).unwrap();

        let readable_anyway = std::fs::read_dir(&locked).is_ok();
        let folders = discover_video_folders(&options(root, usize::MAX));
        std::fs::set_permissions(&locked, std::fs::Permissions::from_mode(0o755)).unwrap();

        assert!(folders.contains(&root.join("open")));
        if !readable_anyway {
            assert!(!folders.contains(&locked));
        }
    }

    #[test]
    fn test_storage_mount_points() {
        let mountinfo = "\
22 1 8:1 / / rw,relatime shared:1 - ext4 /dev/sda1 rw
40 22 8:17 / /media/user/SD\\040CARD rw,nosuid shared:2 - vfat /dev/sdb1 rw
41 22 8:33 / /run/media/user/usb rw shared:3 - exfat /dev/sdc1 rw
42 22 0:5 / /proc rw shared:4 - proc proc rw
43 22 0:6 / /mnt rw shared:5 - tmpfs tmpfs rw
garbage line";
        let points = storage_mount_points(mountinfo);
        assert_eq!(
            points,
            vec![
                PathBuf::from("/media/user/SD CARD"),
                PathBuf::from("/run/media/user/usb"),
            ]
        );
    }
}
