//! The ordered install checklist.

use std::collections::BTreeMap;

use crate::config::ProvisionConfig;

use super::types::{Step, StepAction};

const NVM_INSTALLER_URL: &str = "https://raw.githubusercontent.com/nvm-sh/nvm";
const COMPOSER_INSTALLER_URL: &str = "https://getcomposer.org/installer";
const ONDREJ_PPA: &str = "ppa:ondrej/php";
const SURY_REPO_URL: &str = "https://packages.sury.org/php";
const SURY_KEYRING: &str = "/usr/share/keyrings/deb.sury.org-php.gpg";

/// Build the step list for `config`. Order matters: nvm must exist before
/// Node.js, Node.js before Yarn, the PHP repository before PHP, and PHP
/// before Composer.
pub fn build(config: &ProvisionConfig) -> Vec<Step> {
    let env = step_env(config);
    let shell = |script: String| StepAction::Shell {
        script,
        env: env.clone(),
    };

    let mut steps = vec![
        Step {
            id: "timezone",
            title: format!("Setting timezone to {}", config.timezone),
            action: shell(format!(
                "test -f /usr/share/zoneinfo/{tz} && ln -snf /usr/share/zoneinfo/{tz} /etc/localtime && echo {tz} > /etc/timezone",
                tz = config.timezone
            )),
        },
        Step {
            id: "apt-update",
            title: "Updating package lists".to_string(),
            action: shell("apt-get update".to_string()),
        },
    ];

    if !config.packages.is_empty() {
        steps.push(Step {
            id: "base-packages",
            title: format!("Installing {} base packages", config.packages.len()),
            action: shell(apt_install(&config.packages)),
        });
    }

    steps.push(Step {
        id: "nvm",
        title: format!("Installing nvm {}", config.nvm.version),
        action: shell(format!(
            "mkdir -p \"$NVM_DIR\" && curl -fsSL {}/{}/install.sh | bash",
            NVM_INSTALLER_URL, config.nvm.version
        )),
    });

    steps.push(Step {
        id: "nvm-profile",
        title: format!("Registering nvm in {}", config.profile_path),
        action: StepAction::AppendFile {
            path: config.profile_path(),
            lines: profile_lines(&config.nvm_dir()),
        },
    });

    steps.push(Step {
        id: "node",
        title: format!("Installing Node.js {}", config.node.version),
        action: shell(with_nvm(&format!(
            "nvm install {v} && nvm alias default {v}",
            v = config.node.version
        ))),
    });

    if config.yarn {
        steps.push(Step {
            id: "yarn",
            title: "Installing Yarn".to_string(),
            action: shell(with_nvm("npm install -g yarn")),
        });
    }

    // Stock archives only carry one PHP (bookworm 8.2, jammy 8.1).
    if !config.php.version.is_empty() {
        steps.push(Step {
            id: "php-repo",
            title: format!("Adding PHP {} package repository", config.php.version),
            action: shell(php_repo_script()),
        });
    }

    steps.push(Step {
        id: "php",
        title: format!("Installing PHP {}", config.php.version)
            .trim_end()
            .to_string(),
        action: shell(apt_install(&config.php_packages())),
    });

    if config.composer {
        steps.push(Step {
            id: "composer",
            title: "Installing Composer".to_string(),
            action: shell(format!(
                "curl -fsSL {} | php -- --install-dir=/usr/local/bin --filename=composer",
                COMPOSER_INSTALLER_URL
            )),
        });
    }

    steps
}

/// Environment shared by every shell step.
pub fn step_env(config: &ProvisionConfig) -> BTreeMap<String, String> {
    BTreeMap::from([
        ("DEBIAN_FRONTEND".to_string(), "noninteractive".to_string()),
        ("NVM_DIR".to_string(), config.nvm_dir()),
        // Keep the nvm installer away from root's own dotfiles; the
        // system-wide profile is handled by the nvm-profile step.
        ("PROFILE".to_string(), "/dev/null".to_string()),
    ])
}

/// Lines that make nvm available to future interactive shells.
pub fn profile_lines(nvm_dir: &str) -> Vec<String> {
    vec![
        format!("export NVM_DIR=\"{}\"", nvm_dir),
        r#"[ -s "$NVM_DIR/nvm.sh" ] && \. "$NVM_DIR/nvm.sh""#.to_string(),
        r#"[ -s "$NVM_DIR/bash_completion" ] && \. "$NVM_DIR/bash_completion""#.to_string(),
    ]
}

/// Prefix a script so it runs with nvm loaded.
pub fn with_nvm(script: &str) -> String {
    format!(". \"$NVM_DIR/nvm.sh\" && {}", script)
}

/// Ondřej Surý's PPA on Ubuntu, his sury.org archive everywhere else.
fn php_repo_script() -> String {
    format!(
        concat!(
            ". /etc/os-release && ",
            "if [ \"$ID\" = ubuntu ]; then add-apt-repository -y {ppa}; ",
            "else curl -fsSL {url}/apt.gpg -o {keyring} && ",
            "echo \"deb [signed-by={keyring}] {url}/ $VERSION_CODENAME main\" ",
            "> /etc/apt/sources.list.d/php.list; fi && apt-get update"
        ),
        ppa = ONDREJ_PPA,
        url = SURY_REPO_URL,
        keyring = SURY_KEYRING,
    )
}

fn apt_install(packages: &[String]) -> String {
    format!("apt-get install -y {}", packages.join(" "))
}
