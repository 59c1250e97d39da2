//! The built-in "jumpstart" recipe.
//!
//! Gem list, route snippets, stylesheet imports and the rest of the bootstrap
//! sequence, expressed as data for [`PatchService::run`]. Files the recipe
//! copies live under `templates/jumpstart/`.
//!
//! Step order matters: later steps patch files produced by earlier
//! generators (the devise initializer, the user model, the newest
//! migration), so the sequence below must not be reordered.
//!
//! [`PatchService::run`]: railstart_core::application::PatchService::run

use railstart_core::domain::{
    Anchor, DependencySpec, DomainError, FileTarget, GeneratorSpec, Mutation, PackageScript,
    Position, Recipe, ShellSpec, Step, TextInsertion, TextReplacement,
};

pub const RECIPE_NAME: &str = "jumpstart";

const APPLICATION_RB: &str = "config/application.rb";
const DEVELOPMENT_RB: &str = "config/environments/development.rb";
const ROUTES_RB: &str = "config/routes.rb";
const DEVISE_RB: &str = "config/initializers/devise.rb";
const USER_RB: &str = "app/models/user.rb";
const HELPER_RB: &str = "app/helpers/application_helper.rb";
/// Stylesheet entry point written by `css:install:bootstrap`.
pub const STYLESHEET: &str = "app/assets/stylesheets/application.bootstrap.scss";

const JS_PACKAGES: &[&str] = &[
    "local-time",
    "esbuild-rails",
    "trix",
    "@hotwired/stimulus",
    "@hotwired/turbo-rails",
    "@rails/activestorage",
    "@rails/ujs",
    "@rails/request.js",
    "tailwindcss",
    "preline",
    "toastr",
];

const TOASTR_HELPER: &str = r#"  def flash_messages
    capture do
      flash.each do |key, value|
        concat tag.div(
          data: { controller: :flash, flash_key_value: key, flash_value_value: value }
        )
      end
    end
  end
"#;

const SIDEKIQ_ROUTES: &str = r#"  authenticate :user, lambda { |u| u.admin? } do
    mount Sidekiq::Web => '/sidekiq'

    namespace :madmin do
      resources :impersonates do
        post :impersonate, on: :member
        post :stop_impersonating, on: :collection
      end
    end
  end
"#;

const OMNIAUTH_CONFIG: &str = r#"  env_creds = Rails.application.credentials[Rails.env.to_sym] || {}
  %i{ facebook twitter github }.each do |provider|
    if options = env_creds[provider]
      config.omniauth provider, options[:app_id], options[:app_secret], options.fetch(:options, {})
    end
  end

"#;

/// Printed after a successful run.
pub const NEXT_STEPS: &[&str] = &[
    "# Update config/database.yml with your database credentials",
    "rails db:create",
    "rails g noticed:model",
    "rails db:migrate",
    "rails g madmin:install # Generate admin dashboards",
    "gem install foreman",
    "bin/dev",
];

/// The jumpstart bootstrap sequence.
pub fn jumpstart() -> Result<Recipe, DomainError> {
    let recipe = Recipe::new(
        RECIPE_NAME,
        "Devise, Pundit, Sidekiq, FriendlyId and Madmin on esbuild, Tailwind and Bootstrap",
    )
    .step(Step::new("add gems").with_all(gems().into_iter().map(Mutation::AddDependency)))
    .step(Step::new("bundle install").with(Mutation::shell("bundle install")?))
    .step(
        Step::new("set application name")
            .with(environment(
                "config.application_name = Rails.application.class.module_parent_name",
            ))
            .note("You can change the application name inside ./config/application.rb"),
    )
    .step(users()?)
    .step(Step::new("authorization").with(generate("pundit:install", &[])))
    .step(
        Step::new("javascript packages").with(Mutation::RunShell(ShellSpec::new(
            "yarn",
            std::iter::once("add").chain(JS_PACKAGES.iter().copied()),
        ))),
    )
    .step(
        Step::new("toastr helper").with(insert_after_line(
            HELPER_RB,
            "module ApplicationHelper",
            TOASTR_HELPER,
        )),
    )
    .step(
        Step::new("announcements")
            .with(generate(
                "model",
                &[
                    "Announcement",
                    "published_at:datetime",
                    "announcement_type",
                    "name",
                    "description:text",
                ],
            ))
            .with(route("resources :announcements, only: [:index]")),
    )
    .step(Step::new("notifications").with(route("resources :notifications, only: [:index]")))
    .step(multiple_authentication())
    .step(
        Step::new("sidekiq")
            .with(environment("config.active_job.queue_adapter = :sidekiq"))
            .with(Mutation::InsertText(TextInsertion::new(
                ROUTES_RB,
                Anchor::line("Rails.application.routes.draw do"),
                "require 'sidekiq/web'\n\n",
                Position::Before,
            )))
            .with(insert_after_line(
                ROUTES_RB,
                "Rails.application.routes.draw do",
                SIDEKIQ_ROUTES,
            )),
    )
    .step(
        Step::new("friendly_id")
            .with(generate("friendly_id", &[]))
            .with(Mutation::ReplaceText(TextReplacement::new(
                FileTarget::first_matching("db/migrate", "friendly_id_slugs.rb"),
                r"(?m)ActiveRecord::Migration$",
                "ActiveRecord::Migration[5.2]",
            )?)),
    )
    .step(Step::new("bootstrap css").with(task("css:install:bootstrap")))
    .step(Step::new("whenever").with(Mutation::shell("wheneverize .")?))
    .step(Step::new("sitemap").with(task("sitemap:install")))
    .step(
        Step::new("stylesheet imports")
            .with(append(STYLESHEET, "@import \"jumpstart/announcements\";"))
            .with(append(
                STYLESHEET,
                "@import 'tailwindcss/base';\n@import 'tailwindcss/components';\n@import 'tailwindcss/utilities';",
            ))
            .with(append(STYLESHEET, "@import \"~preline-ui/src/preline-ui\";"))
            .with(append(STYLESHEET, "@import \"toastr/toastr\";")),
    )
    .step(Step::new("active storage").with(task("active_storage:install")))
    .step(
        Step::new("lock linux platform")
            .with(Mutation::shell("bundle lock --add-platform x86_64-linux")?),
    )
    .step(copy_templates())
    .step(
        Step::new("esbuild build script")
            .with(Mutation::SetPackageScript(PackageScript::new(
                "build",
                "node esbuild.config.mjs",
            )))
            .with(Mutation::shell("yarn build")?),
    )
    .step(Step::new("tailwind config").with(Mutation::copy("tailwind.config.js")))
    .step(
        Step::new("git init")
            .version_control()
            .with(Mutation::shell("git init")?)
            .with(Mutation::shell("git add .")?),
    )
    .step(
        // Fails when user.email is not configured; the project is usable anyway.
        Step::new("git commit")
            .version_control()
            .tolerate_failure()
            .with(Mutation::RunShell(ShellSpec::new(
                "git",
                ["commit", "-m", "Initial commit"],
            ))),
    );

    recipe.validate()?;
    Ok(recipe)
}

fn gems() -> Vec<DependencySpec> {
    vec![
        DependencySpec::new("cssbundling-rails"),
        DependencySpec::new("devise").version("~> 4.9"),
        DependencySpec::new("friendly_id").version("~> 5.4"),
        DependencySpec::new("jsbundling-rails"),
        DependencySpec::new("madmin"),
        DependencySpec::new("name_of_person").version("~> 1.1"),
        DependencySpec::new("noticed").version("~> 1.4"),
        DependencySpec::new("omniauth-facebook").version("~> 8.0"),
        DependencySpec::new("omniauth-github").version("~> 2.0"),
        DependencySpec::new("omniauth-twitter").version("~> 1.4"),
        DependencySpec::new("pretender").version("~> 0.3.4"),
        DependencySpec::new("pundit").version("~> 2.1"),
        DependencySpec::new("sidekiq").version("~> 6.2"),
        DependencySpec::new("sitemap_generator").version("~> 6.1"),
        DependencySpec::new("whenever").without_require(),
        DependencySpec::new("responders").github("heartcombo/responders", Some("main")),
    ]
}

fn users() -> Result<Step, DomainError> {
    Ok(Step::new("users")
        .with(route("root to: 'home#index'"))
        .with(generate("devise:install", &[]))
        .with(Mutation::InsertText(TextInsertion::new(
            DEVELOPMENT_RB,
            Anchor::line("Rails.application.configure do"),
            "  config.action_mailer.default_url_options = { host: 'localhost', port: 3000 }",
            Position::After,
        )))
        .with(generate(
            "devise",
            &[
                "User",
                "first_name",
                "last_name",
                "announcements_last_read_at:datetime",
                "admin:boolean",
            ],
        ))
        .with(Mutation::ReplaceText(TextReplacement::new(
            FileTarget::latest("db/migrate"),
            r":admin\b",
            ":admin, default: false",
        )?))
        .with(Mutation::ReplaceText(TextReplacement::new(
            DEVISE_RB,
            r"(?m)^  # config\.secret_key = .+$",
            "  config.secret_key = Rails.application.credentials.secret_key_base",
        )?))
        .with(Mutation::InsertText(TextInsertion::new(
            USER_RB,
            Anchor::substring("devise :"),
            "omniauthable, :",
            Position::After,
        ))))
}

fn multiple_authentication() -> Step {
    Step::new("multiple authentication")
        .with(Mutation::InsertText(TextInsertion::new(
            ROUTES_RB,
            Anchor::substring("devise_for :users"),
            r#", controllers: { omniauth_callbacks: "users/omniauth_callbacks" }"#,
            Position::After,
        )))
        .with(generate(
            "model",
            &[
                "Service",
                "user:references",
                "provider",
                "uid",
                "access_token",
                "access_token_secret",
                "refresh_token",
                "expires_at:datetime",
                "auth:text",
            ],
        ))
        .with(Mutation::InsertText(TextInsertion::new(
            DEVISE_RB,
            Anchor::line("# ==> Warden configuration"),
            OMNIAUTH_CONFIG,
            Position::Before,
        )))
}

fn copy_templates() -> Step {
    Step::new("copy templates")
        .with(Mutation::remove("app/assets/stylesheets/application.css"))
        .with_all(
            [
                "Procfile",
                "Procfile.dev",
                ".foreman",
                "esbuild.config.mjs",
                "app/javascript/application.js",
                "app/javascript/controllers/index.js",
            ]
            .into_iter()
            .map(Mutation::copy),
        )
        .with(Mutation::CopyDirectory {
            source: "app".into(),
            destination: "app".into(),
            overwrite: true,
        })
        .with(route("get '/terms', to: 'home#terms'"))
        .with(route("get '/privacy', to: 'home#privacy'"))
}

// ----------------------------------------------------------------------------
// Rails-flavoured shorthands
// ----------------------------------------------------------------------------

/// A line in `config/application.rb`, inside the application class.
fn environment(line: &str) -> Mutation {
    insert_after_line(
        APPLICATION_RB,
        "class Application < Rails::Application",
        &format!("    {line}"),
    )
}

/// A route at the top of the routes block.
fn route(line: &str) -> Mutation {
    insert_after_line(
        ROUTES_RB,
        "Rails.application.routes.draw do",
        &format!("  {line}"),
    )
}

fn insert_after_line(target: &str, anchor: &str, text: &str) -> Mutation {
    Mutation::InsertText(TextInsertion::new(
        target,
        Anchor::line(anchor),
        text,
        Position::After,
    ))
}

fn append(target: &str, text: &str) -> Mutation {
    Mutation::InsertText(TextInsertion::append(target, text))
}

fn generate(name: &str, args: &[&str]) -> Mutation {
    Mutation::RunGenerator(GeneratorSpec::generate(name, args.iter().copied()))
}

fn task(name: &str) -> Mutation {
    Mutation::RunGenerator(GeneratorSpec::task(name))
}
