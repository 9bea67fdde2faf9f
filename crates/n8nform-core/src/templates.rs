//! Built-in artifact templates
//!
//! Tera templates rendered against the context built in `generator`.
//! Keep `{#` out of shell snippets: Tera reads it as a comment opener.

/// Terraform description of the n8n instance
pub const INFRA: &str = r#"# n8nform: infrastructure for {{ hostname }}

provider "google" {
  project     = "{{ project_id }}"
  region      = "{{ region }}"
  credentials = file("{{ credentials_file }}")
}

variable "ssh_private_key_path" {
  description = "Private key matching the ssh-keys metadata, used by the provisioners"
  type        = string
  default     = "~/.ssh/id_rsa"
}
{%- if inject_ssh_keys %}

variable "ssh_keys" {
  description = "ssh-keys metadata entry (user:ssh-rsa ...), e.g. via TF_VAR_ssh_keys"
  type        = string
  sensitive   = true
}
{%- endif %}
{%- if firewall_rule %}

resource "google_compute_firewall" "allow_n8n_port" {
  name    = "{{ firewall_rule }}"
  network = "default"

  allow {
    protocol = "tcp"
    ports    = ["{{ n8n_port }}"]
  }

  source_ranges = ["0.0.0.0/0"]
}
{%- endif %}

resource "google_compute_instance" "n8n" {
  name         = "{{ address_name }}"
  machine_type = "{{ machine_type }}"
  zone         = "{{ zone }}"

  boot_disk {
    initialize_params {
      image = "{{ boot_image }}"
      size  = {{ disk_size_gb }}
    }
  }

  network_interface {
    network = "default"
    access_config {
      nat_ip       = "{{ static_ip }}"
      network_tier = "{{ network_tier }}"
    }
  }

  metadata = {
{%- if inject_ssh_keys %}
    "ssh-keys" = var.ssh_keys
{%- else %}
    "ssh-keys" = "{{ ssh_key }}"
{%- endif %}
  }

  connection {
    type        = "ssh"
    host        = "{{ static_ip }}"
    user        = "{{ ssh_user }}"
    private_key = file(pathexpand(var.ssh_private_key_path))
  }

  provisioner "remote-exec" {
    inline = ["mkdir -p {{ staging_dir }}"]
  }
{% for upload in uploads %}
  provisioner "file" {
    source      = "{{ upload.filename }}"
    destination = "{{ staging_dir }}/{{ upload.filename }}"
  }
{% endfor %}
  provisioner "remote-exec" {
    inline = [
{%- for upload in uploads %}
      "sudo install -D -m {{ upload.mode }} {{ staging_dir }}/{{ upload.filename }} {{ upload.remote_dir }}/{{ upload.filename }}",
{%- endfor %}
      "rm -rf {{ staging_dir }}",
      "sudo {{ remote_dir }}/{{ bootstrap_script }}",
    ]
  }
}

output "instance_ip" {
  value = google_compute_instance.n8n.network_interface[0].access_config[0].nat_ip
}
"#;

/// Installs Docker and starts the composition
pub const BOOTSTRAP: &str = r#"#!/bin/bash
# n8nform: server setup for {{ hostname }}

set -euo pipefail

echo "=== n8nform: server setup ==="

apt-get update
apt-get install -y ca-certificates curl wget

if ! command -v docker &> /dev/null; then
    echo ">>> installing Docker"
    curl -fsSL https://get.docker.com | sh
fi

if ! docker compose version &> /dev/null; then
    echo ">>> installing the compose plugin"
    apt-get install -y docker-compose-plugin
fi

systemctl enable docker
systemctl start docker

mkdir -p {{ local_files_dir }}
chown 1000:1000 {{ local_files_dir }}

cd {{ remote_dir }}
{%- if custom_image %}
docker compose -f {{ compose_path }} build --pull n8n
docker compose -f {{ compose_path }} pull --ignore-buildable
{%- else %}
docker compose -f {{ compose_path }} pull
{%- endif %}

systemctl daemon-reload
systemctl enable {{ unit_name }}
systemctl restart {{ unit_name }}

echo "n8n is starting on port {{ n8n_port }}"
echo "run {{ remote_dir }}/{{ tunnel_script }} to publish {{ webhook_url }}"
"#;

/// Publishes n8n through a Cloudflare Tunnel
pub const TUNNEL: &str = r#"#!/bin/bash
# n8nform: Cloudflare Tunnel for {{ hostname }}

set -euo pipefail

if ! command -v cloudflared &> /dev/null; then
    wget -q https://github.com/cloudflare/cloudflared/releases/latest/download/cloudflared-linux-amd64 \
        -O /usr/local/bin/cloudflared
    chmod a+x /usr/local/bin/cloudflared
fi
cloudflared update || true

cloudflared tunnel login
cloudflared tunnel create {{ address_name }}
cloudflared tunnel route ip add {{ static_ip }}/32 {{ address_name }}
cloudflared tunnel route dns {{ address_name }} {{ hostname }}

tunnel_id=$(cloudflared tunnel list --name {{ address_name }} --output json \
    | grep -oP '"id":\s*"\K[0-9a-f-]+' | head -n 1)

mkdir -p /etc/cloudflared
cat > /etc/cloudflared/config.yml <<EOF
tunnel: {{ address_name }}
credentials-file: /root/.cloudflared/${tunnel_id}.json
protocol: quic
logfile: /var/log/cloudflared.log
loglevel: info
transport-loglevel: info
ingress:
  - hostname: {{ hostname }}
    service: http://localhost:{{ n8n_port }}
  - service: http_status:404
EOF

cloudflared service install
systemctl enable cloudflared
systemctl restart cloudflared
"#;

/// n8n + API composition
pub const COMPOSE: &str = r#"# n8nform: containers for {{ hostname }}
services:
  n8n:
{%- if custom_image %}
    build:
      context: {{ remote_dir }}
      dockerfile: {{ dockerfile }}
    image: {{ custom_image_tag }}
{%- else %}
    image: {{ n8n_image }}
{%- endif %}
    ports:
      - "{{ n8n_port }}:{{ n8n_port }}"
    environment:
      - N8N_HOST={{ hostname }}
      - N8N_PORT={{ n8n_port }}
      - N8N_PROTOCOL=https
      - WEBHOOK_URL={{ webhook_url }}
    volumes:
      - n8n_data:/home/node/.n8n
      - {{ local_files_dir }}:/files
    restart: unless-stopped

  fastapi:
    image: {{ api_image }}
    ports:
      - "{{ api_port }}:{{ api_port }}"
    environment:
      - PORT={{ api_port }}
    restart: unless-stopped

volumes:
  n8n_data:
"#;

/// systemd unit supervising the composition
pub const UNIT: &str = r#"[Unit]
Description=n8n Docker Compose Application Service
Requires=docker.service
After=docker.service network-online.target

[Service]
Type=simple
WorkingDirectory={{ remote_dir }}
ExecStart=/usr/bin/docker compose -f {{ compose_path }} up
ExecStop=/usr/bin/docker compose -f {{ compose_path }} down
Restart=always
RestartSec=5s

[Install]
WantedBy=multi-user.target
"#;

/// Upgrades the runtime, the tunnel client and the images
pub const UPDATER: &str = r#"#!/bin/bash
# n8nform: update Docker, cloudflared and the n8n stack on {{ hostname }}

set -euo pipefail

echo "=== n8nform: update ==="

apt-get update
apt-get install -y --only-upgrade docker-ce docker-ce-cli containerd.io docker-compose-plugin

if command -v cloudflared &> /dev/null; then
    cloudflared update || true
    systemctl restart cloudflared || true
fi

cd {{ remote_dir }}
{%- if custom_image %}
docker compose -f {{ compose_path }} pull --ignore-buildable
docker compose -f {{ compose_path }} build --pull n8n
{%- else %}
docker compose -f {{ compose_path }} pull
{%- endif %}

systemctl restart {{ unit_name }}
docker image prune -f

echo "update complete"
"#;

/// Customized n8n image
pub const DOCKERFILE: &str = r#"FROM {{ n8n_image }}

USER root
RUN apk add --no-cache su-exec {{ custom_image.extra_package }}

COPY {{ entrypoint_script }} /{{ entrypoint_script }}
RUN chmod 0755 /{{ entrypoint_script }}

ENTRYPOINT ["tini", "--", "/{{ entrypoint_script }}"]
"#;

/// Entrypoint of the customized image
pub const ENTRYPOINT: &str = r#"#!/bin/sh
# n8nform: prepare data directories, then hand off to the stock entrypoint

set -e

for dir in /home/node/.n8n /files; do
    mkdir -p "$dir"
    chown -R node:node "$dir"
done

exec su-exec node /docker-entrypoint.sh "$@"
"#;
