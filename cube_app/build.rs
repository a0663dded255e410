// Compiles GLSL shaders under resources/shaders to SPIR-V in target/shaders

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

const SHADER_EXTENSIONS: [&str; 6] = ["vert", "frag", "comp", "geom", "tesc", "tese"];

fn main() {
    println!("cargo:rerun-if-changed=resources/shaders");
    println!("cargo:rerun-if-env-changed=VULKAN_SDK");
    println!("cargo:rerun-if-env-changed=SKIP_SHADERS");

    if env::var_os("SKIP_SHADERS").is_some() {
        println!("cargo:warning=SKIP_SHADERS set, shader compilation skipped");
        return;
    }

    let Some(glslc) = find_glslc() else {
        println!("cargo:warning=glslc not found (set VULKAN_SDK), shader compilation skipped");
        return;
    };

    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| ".".into()));
    let shader_dir = manifest_dir.join("resources/shaders");
    let target_dir = manifest_dir.join("../target/shaders");

    if let Err(e) = fs::create_dir_all(&target_dir) {
        println!("cargo:warning=Failed to create {}: {e}", target_dir.display());
        return;
    }

    let entries = match fs::read_dir(&shader_dir) {
        Ok(entries) => entries,
        Err(_) => {
            println!("cargo:warning=No shader directory at {}", shader_dir.display());
            return;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        let is_shader = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| SHADER_EXTENSIONS.contains(&ext));
        if !is_shader {
            continue;
        }

        // simple.vert -> simple.vert.spv
        let Some(file_name) = path.file_name() else {
            continue;
        };
        let mut out_name = file_name.to_os_string();
        out_name.push(".spv");
        let out_file = target_dir.join(out_name);

        if is_up_to_date(&path, &out_file) {
            continue;
        }

        let status = Command::new(&glslc).arg(&path).arg("-o").arg(&out_file).status();
        match status {
            Ok(s) if s.success() => {}
            Ok(s) => panic!(
                "glslc failed for {} with exit code {}",
                path.display(),
                s.code().unwrap_or(-1)
            ),
            Err(e) => panic!("Failed to run glslc for {}: {e}", path.display()),
        }
    }
}

fn find_glslc() -> Option<PathBuf> {
    let sdk = env::var_os("VULKAN_SDK")?;
    let glslc = if cfg!(target_os = "windows") {
        Path::new(&sdk).join("Bin").join("glslc.exe")
    } else {
        Path::new(&sdk).join("bin").join("glslc")
    };
    glslc.exists().then_some(glslc)
}

fn is_up_to_date(source: &Path, output: &Path) -> bool {
    let modified = |path: &Path| fs::metadata(path).and_then(|m| m.modified()).ok();
    match (modified(source), modified(output)) {
        (Some(src), Some(dst)) => dst >= src,
        _ => false,
    }
}
